use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::StoreError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The list/expiry primitives the history store needs from a cache server.
///
/// Lists are stored newest-first: `push_front` inserts at the head and
/// `range` returns elements head to tail. Every command is atomic on its
/// own; `replace` is atomic as a whole.
///
/// Methods return boxed futures for dyn compatibility.
pub trait HistoryCache: Send + Sync {
    /// Open the connection. Replaces any existing one.
    fn connect(&self) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Drop the connection. Later commands fail with `Unavailable`.
    fn disconnect(&self) -> BoxFuture<'_, ()>;

    /// Round trip to the server.
    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>>;

    /// All elements of the list at `key`, head first. Missing key = empty.
    fn range(&self, key: &str) -> BoxFuture<'_, Result<Vec<String>, StoreError>>;

    /// Number of elements in the list at `key`. Missing key = 0.
    fn len(&self, key: &str) -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Insert `value` at the head of the list, creating it if needed.
    fn push_front(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Set the expiry of `key`. A missing key is left alone.
    fn expire(&self, key: &str, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Remaining time to live. `None` if the key is missing or never expires.
    fn ttl(&self, key: &str) -> BoxFuture<'_, Result<Option<Duration>, StoreError>>;

    /// Delete `key`. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Atomically delete `key`, push each of `values` to the head in order,
    /// and set the expiry. With no values the key is simply deleted.
    fn replace(
        &self,
        key: &str,
        values: Vec<String>,
        ttl: Duration,
    ) -> BoxFuture<'_, Result<(), StoreError>>;
}
