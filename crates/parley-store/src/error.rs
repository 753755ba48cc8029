use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache connection unavailable")]
    Unavailable,

    #[error("cache connection failed: {0}")]
    Connection(String),

    #[error("cache {operation} failed: {message}")]
    Command {
        operation: &'static str,
        message: String,
    },

    #[error("invalid cache url: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Whether this failure means the connection itself is gone, as opposed
    /// to a single command being rejected.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Connection(_))
    }
}
