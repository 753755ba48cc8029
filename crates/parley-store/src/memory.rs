//! In-process cache with the same list and expiry semantics as the Redis
//! backend.
//!
//! Expiry follows the tokio clock, so a paused runtime can step through a
//! retention window deterministically. Faults can be injected to exercise
//! degraded paths: [`MemoryCache::set_down`] makes the server unreachable
//! and [`MemoryCache::fail_expire`] makes `EXPIRE` reject.
//! [`MemoryCache::set_connect_delay`] slows down the connect handshake.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{BoxFuture, HistoryCache};
use crate::error::StoreError;

struct Entry {
    items: VecDeque<String>,
    expires_at: Option<Instant>,
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    connected: AtomicBool,
    down: AtomicBool,
    fail_expire: AtomicBool,
    connect_delay_ms: AtomicU64,
    commands: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the server going away (or coming back). Going down also
    /// drops the current connection.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
        if down {
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    /// Make every `EXPIRE` command fail while other commands keep working.
    pub fn fail_expire(&self, fail: bool) {
        self.fail_expire.store(fail, Ordering::SeqCst);
    }

    /// Make every connect take `delay` before it completes.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.connect_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of commands issued against the cache since creation,
    /// including failed ones. Connection management is not counted.
    pub fn command_count(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    /// Write a raw list element at the head of `key`, bypassing the codec.
    pub fn push_raw(&self, key: &str, value: impl Into<String>) {
        let mut entries = self.lock();
        entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                items: VecDeque::new(),
                expires_at: None,
            })
            .items
            .push_front(value.into());
    }

    /// Raw list elements at `key`, head first.
    pub fn raw(&self, key: &str) -> Vec<String> {
        let mut entries = self.lock();
        purge_expired(&mut entries, key);
        entries
            .get(key)
            .map(|e| e.items.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count the command and fail it if the server is unreachable.
    fn begin(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("connection reset by peer".to_string()));
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(self.lock())
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>, key: &str) {
    let expired = entries
        .get(key)
        .and_then(|e| e.expires_at)
        .is_some_and(|at| at <= Instant::now());
    if expired {
        entries.remove(key);
    }
}

impl HistoryCache for MemoryCache {
    fn connect(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let delay = self.connect_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.down.load(Ordering::SeqCst) {
                return Err(StoreError::Connection("connection refused".to_string()));
            }
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.connected.store(false, Ordering::SeqCst);
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.begin()?;
            Ok(())
        })
    }

    fn range(&self, key: &str) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.begin()?;
            purge_expired(&mut entries, &key);
            Ok(entries
                .get(&key)
                .map(|e| e.items.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn len(&self, key: &str) -> BoxFuture<'_, Result<usize, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.begin()?;
            purge_expired(&mut entries, &key);
            Ok(entries.get(&key).map_or(0, |e| e.items.len()))
        })
    }

    fn push_front(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.begin()?;
            purge_expired(&mut entries, &key);
            entries
                .entry(key)
                .or_insert_with(|| Entry {
                    items: VecDeque::new(),
                    expires_at: None,
                })
                .items
                .push_front(value);
            Ok(())
        })
    }

    fn expire(&self, key: &str, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.begin()?;
            if self.fail_expire.load(Ordering::SeqCst) {
                return Err(StoreError::Command {
                    operation: "EXPIRE",
                    message: "command rejected".to_string(),
                });
            }
            purge_expired(&mut entries, &key);
            if let Some(entry) = entries.get_mut(&key) {
                entry.expires_at = Some(Instant::now() + ttl);
            }
            Ok(())
        })
    }

    fn ttl(&self, key: &str) -> BoxFuture<'_, Result<Option<Duration>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.begin()?;
            purge_expired(&mut entries, &key);
            // Whole seconds, rounded like the server's TTL reply.
            Ok(entries.get(&key).and_then(|e| e.expires_at).map(|at| {
                let remaining = at.saturating_duration_since(Instant::now());
                Duration::from_secs((remaining.as_millis() as u64 + 500) / 1000)
            }))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.begin()?;
            entries.remove(&key);
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
            let mut entries = self.begin()?;
            entries.remove(&key);
            if values.is_empty() {
                return Ok(());
            }
            let mut items = VecDeque::with_capacity(values.len());
            for value in values {
                items.push_front(value);
            }
            entries.insert(
                key,
                Entry {
                    items,
                    expires_at: Some(Instant::now() + ttl),
                },
            );
            Ok(())
        })
    }
}
