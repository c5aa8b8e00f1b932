//! Newline-delimited JSON protocol spoken by the stdio host
//!
//! Request: `{"instanceId": "...", "method": "...", "args": {...} | "<json>"}`
//! Reply: `{"instanceId": "...", "result": ...}` or `{"instanceId": "...", "error": "..."}`

use pusher_bridge::{InstanceManager, Reply, Result as BridgeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One command line read from the host
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRequest {
    pub instance_id: String,
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl HostRequest {
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Argument payload as JSON text
    ///
    /// Accepts an inline object or an already encoded string; a missing
    /// payload becomes `{}`.
    pub fn args_json(&self) -> String {
        match &self.args {
            Value::String(encoded) => encoded.clone(),
            Value::Null => "{}".to_string(),
            other => other.to_string(),
        }
    }
}

/// Reply written back for each request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReply {
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostReply {
    pub fn from_result(instance_id: Option<String>, result: BridgeResult<Reply>) -> Self {
        match result {
            Ok(reply) => Self {
                instance_id,
                result: Some(reply.to_value()),
                error: None,
            },
            Err(e) => Self {
                instance_id,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn error(instance_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            instance_id,
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn to_json(&self) -> String {
        // Only strings and JSON values: encoding cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Handle one input line
///
/// Returns `None` for blank lines.
pub fn handle_line(manager: &InstanceManager, line: &str) -> Option<HostReply> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let reply = match HostRequest::parse(line) {
        Ok(request) => {
            let args = request.args_json();
            let result = manager.dispatch(request.instance_id.as_str(), &request.method, &args);
            HostReply::from_result(Some(request.instance_id), result)
        }
        Err(e) => HostReply::error(None, format!("Malformed request: {}", e)),
    };
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pusher_bridge::LoopbackFactory;
    use serde_json::json;
    use std::sync::Arc;

    fn manager() -> InstanceManager {
        InstanceManager::new(Arc::new(LoopbackFactory::new()))
    }

    #[test]
    fn test_args_forms() {
        let inline = HostRequest::parse(
            r#"{"instanceId":"a","method":"subscribe","args":{"channelName":"x"}}"#,
        )
        .unwrap();
        assert_eq!(inline.args_json(), r#"{"channelName":"x"}"#);

        let encoded = HostRequest::parse(
            r#"{"instanceId":"a","method":"subscribe","args":"{\"channelName\":\"x\"}"}"#,
        )
        .unwrap();
        assert_eq!(encoded.args_json(), r#"{"channelName":"x"}"#);

        let missing = HostRequest::parse(r#"{"instanceId":"a","method":"connect"}"#).unwrap();
        assert_eq!(missing.args_json(), "{}");
    }

    #[test]
    fn test_void_reply_has_null_result() {
        let manager = manager();
        let reply = handle_line(
            &manager,
            r#"{"instanceId":"a","method":"init","args":{"appKey":"k"}}"#,
        )
        .unwrap();

        let value: Value = serde_json::from_str(&reply.to_json()).unwrap();
        assert_eq!(value, json!({"instanceId": "a", "result": null}));
    }

    #[test]
    fn test_socket_id_reply() {
        let manager = manager();
        handle_line(&manager, r#"{"instanceId":"a","method":"init","args":{"appKey":"k"}}"#);
        handle_line(&manager, r#"{"instanceId":"a","method":"connect"}"#);

        let reply = handle_line(&manager, r#"{"instanceId":"a","method":"getSocketId"}"#).unwrap();
        assert_eq!(reply.result, Some(json!("1.1")));
    }

    #[test]
    fn test_unsupported_method_reply() {
        let manager = manager();
        let reply = handle_line(&manager, r#"{"instanceId":"a","method":"explode"}"#).unwrap();
        assert_eq!(reply.instance_id.as_deref(), Some("a"));
        assert_eq!(reply.error.as_deref(), Some("Unsupported command: explode"));
        assert!(reply.result.is_none());
    }

    #[test]
    fn test_malformed_and_blank_lines() {
        let manager = manager();
        assert!(handle_line(&manager, "   ").is_none());

        let reply = handle_line(&manager, "{oops").unwrap();
        assert!(reply.instance_id.is_none());
        assert!(reply.error.unwrap().starts_with("Malformed request"));
    }
}
