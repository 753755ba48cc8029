use std::env;
use std::time::Duration;

use parley_core::keys;
use serde::{Deserialize, Serialize};

const DEFAULT_CACHE_URL: &str = "redis://127.0.0.1:6379/";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;

/// What `load_messages` does when one stored record fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptRecordPolicy {
    /// Treat the whole load as failed and return an empty history.
    #[default]
    Fail,
    /// Drop the bad record and return the rest in order.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub cache_url: String,
    pub key_prefix: String,
    pub history_ttl_secs: u64,
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
    pub health_interval_secs: u64,
    #[serde(default)]
    pub corrupt_records: CorruptRecordPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_url: DEFAULT_CACHE_URL.to_string(),
            key_prefix: keys::DEFAULT_PREFIX.to_string(),
            history_ttl_secs: keys::HISTORY_TTL_SECS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            health_interval_secs: DEFAULT_HEALTH_INTERVAL_SECS,
            corrupt_records: CorruptRecordPolicy::Fail,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `PARLEY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `PARLEY_*` name. Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |name: &str, default: u64| match text(name) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(v) if v > 0 => v,
                _ => {
                    tracing::warn!(env_var = name, value = %raw, "invalid value; using default");
                    default
                }
            },
            None => default,
        };
        let corrupt_records = match text("PARLEY_CORRUPT_RECORDS").as_deref() {
            None => defaults.corrupt_records,
            Some("fail") => CorruptRecordPolicy::Fail,
            Some("skip") => CorruptRecordPolicy::Skip,
            Some(raw) => {
                tracing::warn!(
                    env_var = "PARLEY_CORRUPT_RECORDS",
                    value = %raw,
                    "expected `fail` or `skip`; using default"
                );
                defaults.corrupt_records
            }
        };

        Self {
            cache_url: text("PARLEY_CACHE_URL").unwrap_or(defaults.cache_url),
            key_prefix: text("PARLEY_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            history_ttl_secs: number("PARLEY_HISTORY_TTL_SECS", defaults.history_ttl_secs),
            connect_timeout_ms: number("PARLEY_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms),
            response_timeout_ms: number(
                "PARLEY_RESPONSE_TIMEOUT_MS",
                defaults.response_timeout_ms,
            ),
            health_interval_secs: number(
                "PARLEY_HEALTH_INTERVAL_SECS",
                defaults.health_interval_secs,
            ),
            corrupt_records,
        }
    }

    pub fn history_ttl(&self) -> Duration {
        Duration::from_secs(self.history_ttl_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }
}
