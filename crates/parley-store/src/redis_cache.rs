use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncConnectionConfig, RedisError, RedisResult};
use tokio::sync::RwLock;

use crate::cache::{BoxFuture, HistoryCache};
use crate::config::StoreConfig;
use crate::error::StoreError;

/// [`HistoryCache`] backed by a Redis-compatible server over one shared
/// multiplexed connection.
pub struct RedisCache {
    client: redis::Client,
    connect_timeout: Duration,
    response_timeout: Duration,
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisCache {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.cache_url.as_str())
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {e}", config.cache_url)))?;
        Ok(Self {
            client,
            connect_timeout: config.connect_timeout(),
            response_timeout: config.response_timeout(),
            connection: RwLock::new(None),
        })
    }

    /// Clone of the live connection handle. Multiplexed handles are cheap
    /// to clone and share one socket.
    async fn conn(&self) -> Result<MultiplexedConnection, StoreError> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or(StoreError::Unavailable)
    }
}

/// Classify a client error: socket-level failures mean the connection is
/// gone, anything else is a rejected command.
///
/// A response timeout surfaces as an IO error but leaves the multiplexed
/// connection usable, so it is a command failure.
pub fn command_error(operation: &'static str, err: RedisError) -> StoreError {
    if err.is_timeout() {
        return StoreError::Command {
            operation,
            message: err.to_string(),
        };
    }
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        StoreError::Connection(format!("{operation}: {err}"))
    } else {
        StoreError::Command {
            operation,
            message: err.to_string(),
        }
    }
}

impl HistoryCache for RedisCache {
    fn connect(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let config = AsyncConnectionConfig::new()
                .set_connection_timeout(self.connect_timeout)
                .set_response_timeout(self.response_timeout);
            let conn = self
                .client
                .get_multiplexed_async_connection_with_config(&config)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            *self.connection.write().await = Some(conn);
            Ok(())
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.connection.write().await.take();
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
            result.map_err(|e| command_error("PING", e))?;
            Ok(())
        })
    }

    fn range(&self, key: &str) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let result: RedisResult<Vec<String>> = redis::cmd("LRANGE")
                .arg(&key)
                .arg(0)
                .arg(-1)
                .query_async(&mut conn)
                .await;
            result.map_err(|e| command_error("LRANGE", e))
        })
    }

    fn len(&self, key: &str) -> BoxFuture<'_, Result<usize, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let result: RedisResult<usize> =
                redis::cmd("LLEN").arg(&key).query_async(&mut conn).await;
            result.map_err(|e| command_error("LLEN", e))
        })
    }

    fn push_front(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let result: RedisResult<i64> = redis::cmd("LPUSH")
                .arg(&key)
                .arg(value)
                .query_async(&mut conn)
                .await;
            result.map_err(|e| command_error("LPUSH", e))?;
            Ok(())
        })
    }

    fn expire(&self, key: &str, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let result: RedisResult<i64> = redis::cmd("EXPIRE")
                .arg(&key)
                .arg(ttl.as_secs())
                .query_async(&mut conn)
                .await;
            result.map_err(|e| command_error("EXPIRE", e))?;
            Ok(())
        })
    }

    fn ttl(&self, key: &str) -> BoxFuture<'_, Result<Option<Duration>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let result: RedisResult<i64> =
                redis::cmd("TTL").arg(&key).query_async(&mut conn).await;
            let secs = result.map_err(|e| command_error("TTL", e))?;
            // -2: no such key, -1: no expiry
            Ok(u64::try_from(secs).ok().map(Duration::from_secs))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let result: RedisResult<i64> =
                redis::cmd("DEL").arg(&key).query_async(&mut conn).await;
            result.map_err(|e| command_error("DEL", e))?;
            Ok(())
        })
    }

    fn replace(
        &self,
        key: &str,
        values: Vec<String>,
        ttl: Duration,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut conn = self.conn().await?;
            let mut pipe = redis::pipe();
            pipe.atomic();
            pipe.cmd("DEL").arg(&key).ignore();
            if !values.is_empty() {
                pipe.cmd("LPUSH").arg(&key);
                for value in &values {
                    pipe.arg(value);
                }
                pipe.ignore();
                pipe.cmd("EXPIRE").arg(&key).arg(ttl.as_secs()).ignore();
            }
            let result: RedisResult<()> = pipe.query_async(&mut conn).await;
            result.map_err(|e| command_error("MULTI/EXEC", e))
        })
    }
}
