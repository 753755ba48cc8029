use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of the shared cache connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Error = 3,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Error,
            _ => Self::Disconnected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomically readable connection state. The health flag is derived from
/// it: healthy iff `Connected`.
#[derive(Debug)]
pub struct HealthState {
    state: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
        }
    }
}

impl HealthState {
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_healthy(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    /// Move to `next`, returning the previous state.
    pub fn transition(&self, next: ConnectionState) -> ConnectionState {
        let previous = ConnectionState::from_u8(self.state.swap(next as u8, Ordering::AcqRel));
        if previous != next {
            match next {
                ConnectionState::Error => {
                    tracing::warn!(from = %previous, to = %next, "cache connection state changed")
                }
                _ => tracing::info!(from = %previous, to = %next, "cache connection state changed"),
            }
        }
        previous
    }
}
