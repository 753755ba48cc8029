use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parley_core::codec;
use parley_core::keys;
use parley_core::models::Message;

use crate::cache::HistoryCache;
use crate::config::{CorruptRecordPolicy, StoreConfig};
use crate::error::StoreError;
use crate::redis_cache::RedisCache;
use crate::state::{ConnectionState, HealthState};

/// Per-identity chat history in a key-value cache.
///
/// Construct once at startup, share as `Arc<ChatHistoryStore>`, call
/// [`connect`](Self::connect) and eventually [`shutdown`](Self::shutdown).
/// Operations never return errors: a history that cannot be read comes
/// back empty and a write that cannot complete returns `false`. Callers
/// that need to tell "nothing stored" from "cache down" check
/// [`connection_status`](Self::connection_status).
pub struct ChatHistoryStore {
    cache: Arc<dyn HistoryCache>,
    config: StoreConfig,
    health: HealthState,
    closed: AtomicBool,
}

impl ChatHistoryStore {
    pub fn new(cache: Arc<dyn HistoryCache>, config: StoreConfig) -> Self {
        Self {
            cache,
            config,
            health: HealthState::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Store backed by the Redis server at `config.cache_url`. Only the URL
    /// is checked here; nothing is dialled until [`connect`](Self::connect).
    pub fn redis(config: StoreConfig) -> Result<Self, StoreError> {
        let cache = RedisCache::new(&config)?;
        Ok(Self::new(Arc::new(cache), config))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the cache connection. Returns whether the store is now healthy.
    pub async fn connect(&self) -> bool {
        self.closed.store(false, Ordering::SeqCst);
        self.health.transition(ConnectionState::Connecting);
        match self.cache.connect().await {
            Ok(()) if self.is_closed() => {
                // Shut down while dialling.
                self.cache.disconnect().await;
                self.health.transition(ConnectionState::Disconnected);
                false
            }
            Ok(()) => {
                self.health.transition(ConnectionState::Connected);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "cache connect failed");
                self.health.transition(ConnectionState::Error);
                false
            }
        }
    }

    /// Drop the cache connection for good. The health monitor will not
    /// reopen it; an explicit [`connect`](Self::connect) will.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.cache.disconnect().await;
        self.health.transition(ConnectionState::Disconnected);
        tracing::info!("chat history store shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Health flag: true only while the cache connection is up.
    pub fn connection_status(&self) -> bool {
        self.health.is_healthy()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.health.get()
    }

    /// Ping the cache. A connection-level failure marks the store
    /// unhealthy.
    pub async fn ping(&self) -> bool {
        match self.cache.ping().await {
            Ok(()) => true,
            Err(e) => {
                self.record_failure("ping", &e);
                false
            }
        }
    }

    /// History for `identity`, oldest first.
    pub async fn load_messages(&self, identity: &str) -> Vec<Message> {
        let Some(key) = self.key_for("load", identity) else {
            return Vec::new();
        };
        let payloads = match self.cache.range(&key).await {
            Ok(payloads) => payloads,
            Err(e) => {
                self.record_failure("load", &e);
                return Vec::new();
            }
        };

        // Stored newest-first.
        let mut messages = Vec::with_capacity(payloads.len());
        let mut skipped = 0usize;
        for payload in payloads.iter().rev() {
            match codec::decode(payload) {
                Ok(message) => messages.push(message),
                Err(e) => match self.config.corrupt_records {
                    CorruptRecordPolicy::Fail => {
                        tracing::warn!(%key, error = %e, "corrupt history record; discarding load");
                        return Vec::new();
                    }
                    CorruptRecordPolicy::Skip => {
                        tracing::warn!(%key, error = %e, "corrupt history record skipped");
                        skipped += 1;
                    }
                },
            }
        }
        tracing::debug!(%key, count = messages.len(), skipped, "history loaded");
        messages
    }

    /// Replace the whole history for `identity` with `messages`. An empty
    /// slice deletes the history.
    pub async fn save_messages(&self, identity: &str, messages: &[Message]) -> bool {
        let Some(key) = self.key_for("save", identity) else {
            return false;
        };
        let payloads = match codec::encode_all(messages) {
            Ok(payloads) => payloads,
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to encode history");
                return false;
            }
        };
        let count = payloads.len();
        match self.cache.replace(&key, payloads, self.ttl()).await {
            Ok(()) => {
                tracing::debug!(%key, count, "history saved");
                true
            }
            Err(e) => {
                self.record_failure("save", &e);
                false
            }
        }
    }

    /// Append `message` as the newest entry and restart the retention
    /// window. A failed expiry refresh is logged but does not fail the
    /// append; the message is already stored.
    pub async fn add_message(&self, identity: &str, message: &Message) -> bool {
        let Some(key) = self.key_for("add", identity) else {
            return false;
        };
        let payload = match codec::encode(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to encode message");
                return false;
            }
        };
        if let Err(e) = self.cache.push_front(&key, payload).await {
            self.record_failure("add", &e);
            return false;
        }
        if let Err(e) = self.cache.expire(&key, self.ttl()).await {
            tracing::warn!(%key, error = %e, "message stored but expiry refresh failed");
            if e.is_connection_error() {
                self.health.transition(ConnectionState::Error);
            }
        }
        tracing::debug!(%key, id = %message.id, "message appended");
        true
    }

    /// Delete the history for `identity`. Succeeds if there was none.
    pub async fn clear_messages(&self, identity: &str) -> bool {
        let Some(key) = self.key_for("clear", identity) else {
            return false;
        };
        match self.cache.delete(&key).await {
            Ok(()) => {
                tracing::debug!(%key, "history cleared");
                true
            }
            Err(e) => {
                self.record_failure("clear", &e);
                false
            }
        }
    }

    /// Time left before the history for `identity` expires. `None` when
    /// there is no history or the cache is unavailable.
    pub async fn history_ttl(&self, identity: &str) -> Option<Duration> {
        let key = self.key_for("ttl", identity)?;
        match self.cache.ttl(&key).await {
            Ok(ttl) => ttl,
            Err(e) => {
                self.record_failure("ttl", &e);
                None
            }
        }
    }

    /// Number of stored records for `identity`, without decoding them.
    pub async fn message_count(&self, identity: &str) -> usize {
        let Some(key) = self.key_for("count", identity) else {
            return 0;
        };
        match self.cache.len(&key).await {
            Ok(count) => count,
            Err(e) => {
                self.record_failure("count", &e);
                0
            }
        }
    }

    fn ttl(&self) -> Duration {
        self.config.history_ttl()
    }

    /// Cache key for `identity`, or `None` if the operation should not
    /// reach the cache at all.
    fn key_for(&self, operation: &'static str, identity: &str) -> Option<String> {
        let key = match keys::history(&self.config.key_prefix, identity) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(operation, error = %e, "rejected history operation");
                return None;
            }
        };
        if !self.health.is_healthy() {
            tracing::debug!(operation, state = %self.health.get(), "cache unavailable; skipping");
            return None;
        }
        Some(key)
    }

    fn record_failure(&self, operation: &'static str, err: &StoreError) {
        tracing::warn!(operation, error = %err, "cache command failed");
        if err.is_connection_error() {
            self.health.transition(ConnectionState::Error);
        }
    }
}
