//! parley-store
//!
//! Per-identity chat history persisted in a Redis-compatible cache with a
//! 30-day rolling expiry. Every public store operation is total: failures
//! are logged and reported as `false` or an empty history.

pub mod cache;
pub mod config;
pub mod error;
pub mod memory;
pub mod monitor;
pub mod redis_cache;
pub mod state;
pub mod store;

pub use config::{CorruptRecordPolicy, StoreConfig};
pub use monitor::HealthMonitor;
pub use state::ConnectionState;
pub use store::ChatHistoryStore;
