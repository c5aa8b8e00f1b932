use crate::core::instance::InstanceId;
use crate::traits::{BridgeError, ConnectionState, Result};
use serde::{Deserialize, Serialize};

/// Event names generated by the remote service itself
pub mod protocol_events {
    pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher:subscription_succeeded";
    pub const MEMBER_ADDED: &str = "pusher:member_added";
    pub const MEMBER_REMOVED: &str = "pusher:member_removed";
}

/// Code attached to channel-level connection errors
pub const CHANNEL_ERROR_CODE: &str = "Channel error";

/// An event received on a channel
///
/// Either a bound domain event or a channel-level protocol event
/// (subscription confirmation, presence membership).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    /// Payload re-encoded as a JSON string
    pub data: String,
    /// Presence member that joined or left
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A connection state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStateChange {
    pub current_state: String,
    pub previous_state: String,
}

impl ConnectionStateChange {
    pub fn new(previous: ConnectionState, current: ConnectionState) -> Self {
        Self {
            current_state: current.as_str().to_string(),
            previous_state: previous.as_str().to_string(),
        }
    }
}

/// A connection or channel error raised by the remote client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionError {
    pub message: String,
    pub code: Option<String>,
    pub exception: Option<String>,
}

/// What an outbound message carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundKind {
    Event(ChannelEvent),
    StateChange(ConnectionStateChange),
    ConnectionError(ConnectionError),
}

/// One item of the multiplexed outbound stream
///
/// Serialized as
/// `{"event": {...} | null, "connectionStateChange": {...} | null, "instanceId": "..."}`,
/// with an extra `connectionError` object only for error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireMessage", try_from = "WireMessage")]
pub struct OutboundMessage {
    pub instance_id: InstanceId,
    pub kind: OutboundKind,
}

impl OutboundMessage {
    pub fn event(
        instance_id: InstanceId,
        channel: impl Into<String>,
        event: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            instance_id,
            kind: OutboundKind::Event(ChannelEvent {
                channel: channel.into(),
                event: event.into(),
                data: data.into(),
                user_id: None,
            }),
        }
    }

    /// Presence membership change on `channel`
    pub fn member_event(
        instance_id: InstanceId,
        channel: impl Into<String>,
        event: &'static str,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id,
            kind: OutboundKind::Event(ChannelEvent {
                channel: channel.into(),
                event: event.into(),
                data: String::new(),
                user_id: Some(user_id.into()),
            }),
        }
    }

    pub fn state_change(
        instance_id: InstanceId,
        previous: ConnectionState,
        current: ConnectionState,
    ) -> Self {
        Self {
            instance_id,
            kind: OutboundKind::StateChange(ConnectionStateChange::new(previous, current)),
        }
    }

    pub fn connection_error(
        instance_id: InstanceId,
        message: impl Into<String>,
        code: Option<String>,
        exception: Option<String>,
    ) -> Self {
        Self {
            instance_id,
            kind: OutboundKind::ConnectionError(ConnectionError {
                message: message.into(),
                code,
                exception,
            }),
        }
    }

    /// Encode for the outbound stream
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode an outbound stream item
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Short label for logs
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            OutboundKind::Event(_) => "event",
            OutboundKind::StateChange(_) => "connectionStateChange",
            OutboundKind::ConnectionError(_) => "connectionError",
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    event: Option<ChannelEvent>,
    connection_state_change: Option<ConnectionStateChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connection_error: Option<ConnectionError>,
    instance_id: InstanceId,
}

impl From<OutboundMessage> for WireMessage {
    fn from(message: OutboundMessage) -> Self {
        let mut wire = WireMessage {
            event: None,
            connection_state_change: None,
            connection_error: None,
            instance_id: message.instance_id,
        };
        match message.kind {
            OutboundKind::Event(event) => wire.event = Some(event),
            OutboundKind::StateChange(change) => wire.connection_state_change = Some(change),
            OutboundKind::ConnectionError(error) => wire.connection_error = Some(error),
        }
        wire
    }
}

impl TryFrom<WireMessage> for OutboundMessage {
    type Error = BridgeError;

    fn try_from(wire: WireMessage) -> Result<Self> {
        let kind = match (wire.event, wire.connection_state_change, wire.connection_error) {
            (Some(event), None, None) => OutboundKind::Event(event),
            (None, Some(change), None) => OutboundKind::StateChange(change),
            (None, None, Some(error)) => OutboundKind::ConnectionError(error),
            _ => {
                return Err(BridgeError::InvalidArguments {
                    command: "outbound",
                    reason: "exactly one of event, connectionStateChange or connectionError must be set"
                        .into(),
                })
            }
        };
        Ok(Self {
            instance_id: wire.instance_id,
            kind,
        })
    }
}
