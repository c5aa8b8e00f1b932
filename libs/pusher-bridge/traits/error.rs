use thiserror::Error;

/// Main error type for the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Malformed `init` payload or options that cannot produce a client
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed argument payload for a non-init command
    #[error("Invalid arguments for '{command}': {reason}")]
    InvalidArguments {
        command: &'static str,
        reason: String,
    },

    /// Command name outside the supported set
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    /// Outbound message or event payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Signed auth request could not be built or was rejected
    #[error("Auth request failed: {0}")]
    AuthRequest(String),

    /// Operation referenced a channel the instance is not subscribed to
    #[error("Channel '{0}' is not subscribed")]
    NotSubscribed(String),

    /// HTTP transport error while talking to the auth endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BridgeError {
    /// Whether this error is surfaced to the command caller.
    ///
    /// Everything except an unknown command is swallowed at the command
    /// boundary and only logged or reported as a diagnostic.
    pub fn is_caller_visible(&self) -> bool {
        matches!(self, BridgeError::UnsupportedCommand(_))
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
