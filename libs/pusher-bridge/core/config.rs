use crate::core::auth::HttpAuthorizer;
use crate::traits::{BridgeError, ChannelAuthorizer, Headers, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Host used when neither `host` nor `cluster` is given
pub const DEFAULT_HOST: &str = "ws.pusherapp.com";

/// Default activity timeout (milliseconds)
pub const DEFAULT_ACTIVITY_TIMEOUT_MS: u64 = 30_000;

/// Default port for encrypted connections
pub const DEFAULT_WSS_PORT: u16 = 443;

/// Default port for plain connections
pub const DEFAULT_WS_PORT: u16 = 80;

/// Arguments of the `init` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitArgs {
    pub app_key: String,
    #[serde(default)]
    pub options: ConnectionOptions,
    #[serde(default)]
    pub is_logging_enabled: bool,
}

impl InitArgs {
    /// Parse and validate an `init` payload
    pub fn from_json(json: &str) -> Result<Self> {
        let args: InitArgs =
            serde_json::from_str(json).map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        args.validate()?;
        Ok(args)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_key.trim().is_empty() {
            return Err(BridgeError::InvalidConfig("appKey must not be empty".into()));
        }
        if let Some(auth) = &self.options.auth {
            if auth.endpoint.trim().is_empty() {
                return Err(BridgeError::InvalidConfig(
                    "auth.endpoint must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Connection options as supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthOptions>,
}

/// Auth endpoint configuration for private and presence channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthOptions {
    pub endpoint: String,
    #[serde(default)]
    pub headers: Headers,
}

/// Fully resolved options handed to the [`ClientFactory`](crate::traits::ClientFactory)
#[derive(Clone)]
pub struct ClientOptions {
    /// Host after applying host > cluster > default precedence
    pub host: String,
    /// Cluster as supplied (informational once `host` is resolved)
    pub cluster: Option<String>,
    pub port: u16,
    pub encrypted: bool,
    pub activity_timeout: Duration,
    /// Signs private and presence subscriptions, if an auth endpoint was configured
    pub authorizer: Option<Arc<dyn ChannelAuthorizer>>,
}

impl ClientOptions {
    /// Resolve host options into concrete connection settings
    ///
    /// # Arguments
    /// * `options` - Options from the `init` payload
    /// * `logging_enabled` - Forwarded to the authorizer for its own failure logs
    pub fn resolve(options: &ConnectionOptions, logging_enabled: bool) -> Result<Self> {
        let encrypted = options.encrypted.unwrap_or(true);

        let host = match (&options.host, &options.cluster) {
            (Some(host), _) => host.clone(),
            (None, Some(cluster)) => cluster_host(cluster),
            (None, None) => DEFAULT_HOST.to_string(),
        };

        let port = options.port.unwrap_or(if encrypted {
            DEFAULT_WSS_PORT
        } else {
            DEFAULT_WS_PORT
        });

        let activity_timeout = Duration::from_millis(
            options
                .activity_timeout
                .unwrap_or(DEFAULT_ACTIVITY_TIMEOUT_MS),
        );

        let authorizer = match &options.auth {
            Some(auth) => {
                let authorizer = HttpAuthorizer::new(&auth.endpoint, auth.headers.clone())?
                    .with_logging(logging_enabled);
                Some(Arc::new(authorizer) as Arc<dyn ChannelAuthorizer>)
            }
            None => None,
        };

        Ok(Self {
            host,
            cluster: options.cluster.clone(),
            port,
            encrypted,
            activity_timeout,
            authorizer,
        })
    }

    /// Activity timeout in seconds, as the client libraries expect it
    pub fn activity_timeout_secs(&self) -> f64 {
        self.activity_timeout.as_secs_f64()
    }

    /// Check if an auth endpoint is configured
    pub fn has_authorizer(&self) -> bool {
        self.authorizer.is_some()
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("host", &self.host)
            .field("cluster", &self.cluster)
            .field("port", &self.port)
            .field("encrypted", &self.encrypted)
            .field("activity_timeout", &self.activity_timeout)
            .field("has_authorizer", &self.authorizer.is_some())
            .finish()
    }
}

fn cluster_host(cluster: &str) -> String {
    format!("ws-{}.pusher.com", cluster)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(json: &str) -> ConnectionOptions {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_cluster_resolution() {
        let resolved = ClientOptions::resolve(&options(r#"{"cluster":"eu","encrypted":true}"#), false)
            .unwrap();
        assert_eq!(resolved.host, "ws-eu.pusher.com");
        assert_eq!(resolved.port, 443);
        assert!(resolved.encrypted);
        assert_eq!(resolved.activity_timeout, Duration::from_secs(30));
        assert!(!resolved.has_authorizer());
    }

    #[test]
    fn test_host_wins_over_cluster() {
        let resolved = ClientOptions::resolve(
            &options(r#"{"cluster":"eu","host":"soketi.internal"}"#),
            false,
        )
        .unwrap();
        assert_eq!(resolved.host, "soketi.internal");
        assert_eq!(resolved.cluster.as_deref(), Some("eu"));
    }

    #[test]
    fn test_defaults() {
        let resolved = ClientOptions::resolve(&ConnectionOptions::default(), false).unwrap();
        assert_eq!(resolved.host, DEFAULT_HOST);
        assert_eq!(resolved.port, DEFAULT_WSS_PORT);
        assert!(resolved.encrypted);
    }

    #[test]
    fn test_port_follows_encryption_unless_explicit() {
        let plain = ClientOptions::resolve(&options(r#"{"encrypted":false}"#), false).unwrap();
        assert_eq!(plain.port, 80);

        let explicit =
            ClientOptions::resolve(&options(r#"{"encrypted":false,"port":6001}"#), false).unwrap();
        assert_eq!(explicit.port, 6001);
        assert!(!explicit.encrypted);
    }

    #[test]
    fn test_activity_timeout_converted() {
        let resolved =
            ClientOptions::resolve(&options(r#"{"activityTimeout":120000}"#), false).unwrap();
        assert_eq!(resolved.activity_timeout, Duration::from_secs(120));
        assert_eq!(resolved.activity_timeout_secs(), 120.0);

        let fractional =
            ClientOptions::resolve(&options(r#"{"activityTimeout":1500}"#), false).unwrap();
        assert_eq!(fractional.activity_timeout_secs(), 1.5);
    }

    #[test]
    fn test_auth_builds_authorizer() {
        let resolved = ClientOptions::resolve(
            &options(r#"{"auth":{"endpoint":"https://example.com/broadcasting/auth","headers":{}}}"#),
            true,
        )
        .unwrap();
        assert!(resolved.has_authorizer());
    }

    #[test]
    fn test_bad_auth_endpoint_is_invalid_config() {
        let err = ClientOptions::resolve(
            &options(r#"{"auth":{"endpoint":"not a url","headers":{}}}"#),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig(_)));
    }

    #[test]
    fn test_init_args_parsing() {
        let args = InitArgs::from_json(
            r#"{"appKey":"k1","options":{"cluster":"eu","encrypted":true},"isLoggingEnabled":true}"#,
        )
        .unwrap();
        assert_eq!(args.app_key, "k1");
        assert_eq!(args.options.cluster.as_deref(), Some("eu"));
        assert!(args.is_logging_enabled);

        let minimal = InitArgs::from_json(r#"{"appKey":"k2"}"#).unwrap();
        assert_eq!(minimal.options, ConnectionOptions::default());
        assert!(!minimal.is_logging_enabled);
    }

    #[test]
    fn test_init_args_rejects_malformed() {
        assert!(matches!(
            InitArgs::from_json(r#"{"options":{}}"#),
            Err(BridgeError::InvalidConfig(_))
        ));
        assert!(matches!(
            InitArgs::from_json("{not json"),
            Err(BridgeError::InvalidConfig(_))
        ));
        assert!(matches!(
            InitArgs::from_json(r#"{"appKey":"  "}"#),
            Err(BridgeError::InvalidConfig(_))
        ));
        assert!(matches!(
            InitArgs::from_json(r#"{"appKey":"k","options":{"port":"443"}}"#),
            Err(BridgeError::InvalidConfig(_))
        ));
        assert!(matches!(
            InitArgs::from_json(r#"{"appKey":"k","options":{"auth":{"endpoint":""}}}"#),
            Err(BridgeError::InvalidConfig(_))
        ));
    }
}
