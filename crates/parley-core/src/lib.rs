//! parley-core
//!
//! Pure domain types, the message wire codec, and cache key conventions.
//! No cache client dependency. This is the shared vocabulary of the store.

pub mod codec;
pub mod error;
pub mod keys;
pub mod models;
