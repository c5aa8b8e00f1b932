use crate::traits::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP headers attached to auth requests
pub type Headers = HashMap<String, String>;

/// Signature returned by an auth endpoint for a private or presence channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// `<app_key>:<signature>` string passed along with the subscription
    pub auth: String,

    /// Presence member data (presence channels only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<String>,

    /// Shared secret for end-to-end encrypted channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

/// Trait for authorizing private and presence channel subscriptions
///
/// The remote client calls this with its socket id whenever it needs
/// permission to join a restricted channel.
#[async_trait]
pub trait ChannelAuthorizer: Send + Sync {
    /// Build the signed HTTP request for a channel
    ///
    /// # Returns
    /// * `Some(request)` - Ready-to-send request
    /// * `None` - The request could not be built; the subscription fails
    ///   downstream inside the remote client
    fn request_for(&self, socket_id: &str, channel_name: &str) -> Option<reqwest::Request>;

    /// Send the signed request and parse the endpoint's reply
    async fn authorize(&self, socket_id: &str, channel_name: &str) -> Result<AuthResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_optional_fields() {
        let parsed: AuthResponse = serde_json::from_str(r#"{"auth":"key:sig"}"#).unwrap();
        assert_eq!(parsed.auth, "key:sig");
        assert!(parsed.channel_data.is_none());
        assert!(parsed.shared_secret.is_none());

        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, r#"{"auth":"key:sig"}"#);
    }
}
