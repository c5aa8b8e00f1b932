use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection state reported by a remote client
///
/// Rendered on the outbound stream in upper case (`"CONNECTED"`), the same
/// spelling the mobile client libraries use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Initialized,
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
    Reconnecting,
    Unavailable,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Initialized => "INITIALIZED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Disconnecting => "DISCONNECTING",
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Reconnecting => "RECONNECTING",
            ConnectionState::Unavailable => "UNAVAILABLE",
            ConnectionState::Failed => "FAILED",
        }
    }

    /// Check if connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of connection-level notifications from a remote client
///
/// Called from the remote client's own I/O thread(s), never from the
/// command path. Implementations must not block and must not panic.
pub trait ConnectionStateListener: Send + Sync {
    /// Handle a connection state transition
    fn on_state_change(&self, previous: ConnectionState, current: ConnectionState);

    /// Handle a connection or channel level error
    ///
    /// # Arguments
    /// * `message` - Human readable description
    /// * `code` - Optional protocol or library error code
    /// * `exception` - Optional underlying error text
    fn on_error(&self, _message: &str, _code: Option<&str>, _exception: Option<&str>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_strings() {
        assert_eq!(ConnectionState::Connected.as_str(), "CONNECTED");
        assert_eq!(ConnectionState::Disconnecting.to_string(), "DISCONNECTING");
        assert_eq!(
            serde_json::to_string(&ConnectionState::Reconnecting).unwrap(),
            "\"RECONNECTING\""
        );
    }

    #[test]
    fn test_state_predicates() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Reconnecting.is_connected());
    }
}
