//! Wire codec for history list elements.
//!
//! Each message is one list element holding a compact JSON object. The
//! timestamp is an RFC 3339 string in UTC, written with millisecond
//! precision (`2024-05-01T09:30:00.000Z`) unless it carries finer digits.
//! Parsing accepts any RFC 3339 precision.

use crate::error::CoreError;
use crate::models::Message;

/// Serialize a message into its stored form.
pub fn encode(message: &Message) -> Result<String, CoreError> {
    Ok(serde_json::to_string(message)?)
}

/// Serialize a batch, failing on the first message that cannot be encoded.
pub fn encode_all(messages: &[Message]) -> Result<Vec<String>, CoreError> {
    messages.iter().map(encode).collect()
}

/// Parse a stored list element back into a message.
pub fn decode(payload: &str) -> Result<Message, CoreError> {
    Ok(serde_json::from_str(payload)?)
}
