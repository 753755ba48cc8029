//! Redis client error handling, checked without a real server.

use std::io;
use std::net::SocketAddr;

use parley_core::models::{Message, Sender};
use parley_store::error::StoreError;
use parley_store::redis_cache::command_error;
use parley_store::{ChatHistoryStore, ConnectionState, StoreConfig};
use redis::RedisError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn io_error(kind: io::ErrorKind) -> RedisError {
    RedisError::from(io::Error::from(kind))
}

#[test]
fn refused_connection_is_a_connection_error() {
    let err = command_error("LPUSH", io_error(io::ErrorKind::ConnectionRefused));

    assert!(matches!(err, StoreError::Connection(_)));
    assert!(err.is_connection_error());
}

#[test]
fn dropped_connection_is_a_connection_error() {
    for kind in [io::ErrorKind::BrokenPipe, io::ErrorKind::ConnectionReset] {
        let err = command_error("LRANGE", io_error(kind));

        assert!(matches!(err, StoreError::Connection(_)), "{kind:?}");
        assert!(err.is_connection_error());
    }
}

#[test]
fn response_timeout_is_a_command_error() {
    let err = command_error("LPUSH", io_error(io::ErrorKind::TimedOut));

    assert!(matches!(err, StoreError::Command { operation: "LPUSH", .. }));
    assert!(!err.is_connection_error());
}

#[test]
fn server_error_reply_is_a_command_error() {
    let reply = RedisError::from((
        redis::ErrorKind::ResponseError,
        "WRONGTYPE Operation against a key holding the wrong kind of value",
    ));

    let err = command_error("LPUSH", reply);

    assert!(matches!(err, StoreError::Command { operation: "LPUSH", .. }));
    assert!(!err.is_connection_error());
}

/// Parse one RESP array of bulk strings from the front of `buf`.
/// Returns the arguments and the number of bytes consumed.
fn parse_command(buf: &[u8]) -> Option<(Vec<String>, usize)> {
    fn line(buf: &[u8], from: usize) -> Option<(&str, usize)> {
        let end = buf[from..].windows(2).position(|w| w == b"\r\n")? + from;
        Some((std::str::from_utf8(&buf[from..end]).ok()?, end + 2))
    }

    let (header, mut pos) = line(buf, 0)?;
    let count: usize = header.strip_prefix('*')?.parse().ok()?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let (len, next) = line(buf, pos)?;
        let len: usize = len.strip_prefix('$')?.parse().ok()?;
        if buf.len() < next + len + 2 {
            return None;
        }
        args.push(String::from_utf8_lossy(&buf[next..next + len]).into_owned());
        pos = next + len + 2;
    }
    Some((args, pos))
}

/// A server that completes the connection handshake and then never answers
/// another command, while keeping the socket open.
async fn spawn_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let mut silent = false;
                loop {
                    let n = match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    buf.extend_from_slice(&chunk[..n]);
                    while let Some((args, used)) = parse_command(&buf) {
                        buf.drain(..used);
                        let name = args.first().map(|a| a.to_ascii_uppercase());
                        let handshake = matches!(name.as_deref(), Some("CLIENT" | "SELECT"));
                        if !handshake {
                            silent = true;
                        }
                        if !silent && socket.write_all(b"+OK\r\n").await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });
    addr
}

#[tokio::test]
async fn slow_reply_does_not_take_the_store_offline() {
    let addr = spawn_silent_server().await;
    let config = StoreConfig {
        cache_url: format!("redis://{addr}/"),
        response_timeout_ms: 200,
        connect_timeout_ms: 1_000,
        ..StoreConfig::default()
    };
    let store = ChatHistoryStore::redis(config).unwrap();
    assert!(store.connect().await);

    let message = Message::new("m1", "hello", Sender::User, jiff::Timestamp::UNIX_EPOCH);
    assert!(!store.add_message("alice@example.com", &message).await);

    assert_eq!(store.connection_state(), ConnectionState::Connected);
    assert!(store.connection_status());
}
