//! Cache key conventions.
//!
//! Pure string functions. These define the canonical layout of history
//! entries in the cache and must stay stable across deployments.

use crate::error::CoreError;

/// Prefix used when no other is configured.
pub const DEFAULT_PREFIX: &str = "chat:";

/// Retention window for a history, measured from the most recent write.
pub const HISTORY_TTL_SECS: u64 = 2_592_000;

/// Key holding the history list for `identity`.
///
/// The identity is opaque; the only check is that it is non-empty.
pub fn history(prefix: &str, identity: &str) -> Result<String, CoreError> {
    if identity.is_empty() {
        return Err(CoreError::EmptyIdentity);
    }
    Ok(format!("{prefix}{identity}"))
}
