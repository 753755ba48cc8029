use parley_core::error::CoreError;
use parley_core::keys::{self, DEFAULT_PREFIX, HISTORY_TTL_SECS};

#[test]
fn history_key_is_prefix_plus_identity() {
    assert_eq!(
        keys::history(DEFAULT_PREFIX, "alice@example.com").unwrap(),
        "chat:alice@example.com"
    );
    assert_eq!(keys::history("staging:chat:", "bob").unwrap(), "staging:chat:bob");
}

#[test]
fn empty_identity_is_rejected() {
    assert!(matches!(
        keys::history(DEFAULT_PREFIX, ""),
        Err(CoreError::EmptyIdentity)
    ));
}

#[test]
fn retention_is_thirty_days() {
    assert_eq!(HISTORY_TTL_SECS, 30 * 24 * 60 * 60);
}
