//! HTTP channel authorizer
//!
//! Signs private and presence subscriptions by POSTing `socket_id` and
//! `channel_name` to the application's auth endpoint.

use crate::traits::{AuthResponse, BridgeError, ChannelAuthorizer, Headers, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

/// Content type that switches the request body to JSON
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// How the auth request body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEncoding {
    /// `{"socket_id": ..., "channel_name": ...}`
    Json,
    /// `socket_id=...&channel_name=...`
    Form,
}

impl AuthEncoding {
    /// JSON when any header value is the JSON content type, form otherwise
    pub fn for_headers(headers: &Headers) -> Self {
        if headers.values().any(|value| value == JSON_CONTENT_TYPE) {
            AuthEncoding::Json
        } else {
            AuthEncoding::Form
        }
    }
}

/// Authorizer backed by an HTTP endpoint
pub struct HttpAuthorizer {
    endpoint: Url,
    headers: Headers,
    encoding: AuthEncoding,
    client: reqwest::Client,
    logging_enabled: bool,
}

impl HttpAuthorizer {
    /// Create an authorizer for `endpoint`
    ///
    /// Fails with [`BridgeError::InvalidConfig`] if the endpoint is not a valid URL.
    pub fn new(endpoint: &str, headers: Headers) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            BridgeError::InvalidConfig(format!("invalid auth endpoint '{}': {}", endpoint, e))
        })?;
        let encoding = AuthEncoding::for_headers(&headers);

        Ok(Self {
            endpoint,
            headers,
            encoding,
            client: reqwest::Client::new(),
            logging_enabled: false,
        })
    }

    /// Log request build failures
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn encoding(&self) -> AuthEncoding {
        self.encoding
    }

    fn build_request(&self, socket_id: &str, channel_name: &str) -> Result<reqwest::Request> {
        let mut builder = self.client.post(self.endpoint.clone());

        // Caller headers go first so the body helpers keep a caller-supplied Content-Type
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match self.encoding {
            AuthEncoding::Json => builder.json(&serde_json::json!({
                "socket_id": socket_id,
                "channel_name": channel_name,
            })),
            AuthEncoding::Form => {
                builder.form(&[("socket_id", socket_id), ("channel_name", channel_name)])
            }
        };

        builder
            .build()
            .map_err(|e| BridgeError::AuthRequest(e.to_string()))
    }
}

#[async_trait]
impl ChannelAuthorizer for HttpAuthorizer {
    fn request_for(&self, socket_id: &str, channel_name: &str) -> Option<reqwest::Request> {
        match self.build_request(socket_id, channel_name) {
            Ok(request) => Some(request),
            Err(e) => {
                if self.logging_enabled {
                    warn!(channel = channel_name, "Authentication error: {}", e);
                }
                None
            }
        }
    }

    async fn authorize(&self, socket_id: &str, channel_name: &str) -> Result<AuthResponse> {
        let request = self.request_for(socket_id, channel_name).ok_or_else(|| {
            BridgeError::AuthRequest(format!(
                "could not build auth request for channel '{}'",
                channel_name
            ))
        })?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::AuthRequest(format!(
                "auth endpoint returned {} for channel '{}'",
                status, channel_name
            )));
        }

        let body = response.text().await?;
        let parsed: AuthResponse = serde_json::from_str(&body).map_err(|e| {
            BridgeError::AuthRequest(format!("unparsable auth response: {}", e))
        })?;

        if self.logging_enabled {
            debug!(channel = channel_name, "Authorized channel");
        }
        Ok(parsed)
    }
}
