//! Command surface
//!
//! Method names are parsed once into a closed [`Command`] enum; the instance
//! handles every variant in a single exhaustive match.

use crate::core::config::InitArgs;
use crate::traits::{BridgeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Supported command names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Init,
    Connect,
    Disconnect,
    Subscribe,
    Unsubscribe,
    Bind,
    Unbind,
    Trigger,
    GetSocketId,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Init,
        CommandKind::Connect,
        CommandKind::Disconnect,
        CommandKind::Subscribe,
        CommandKind::Unsubscribe,
        CommandKind::Bind,
        CommandKind::Unbind,
        CommandKind::Trigger,
        CommandKind::GetSocketId,
    ];

    /// Method name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Init => "init",
            CommandKind::Connect => "connect",
            CommandKind::Disconnect => "disconnect",
            CommandKind::Subscribe => "subscribe",
            CommandKind::Unsubscribe => "unsubscribe",
            CommandKind::Bind => "bind",
            CommandKind::Unbind => "unbind",
            CommandKind::Trigger => "trigger",
            CommandKind::GetSocketId => "getSocketId",
        }
    }
}

impl FromStr for CommandKind {
    type Err = BridgeError;

    fn from_str(method: &str) -> Result<Self> {
        CommandKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == method)
            .ok_or_else(|| BridgeError::UnsupportedCommand(method.to_string()))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{channelName}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArgs {
    pub channel_name: String,
}

/// `{channelName, eventName}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventArgs {
    pub channel_name: String,
    pub event_name: String,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init(InitArgs),
    Connect,
    Disconnect,
    Subscribe(ChannelArgs),
    Unsubscribe(ChannelArgs),
    Bind(EventArgs),
    Unbind(EventArgs),
    Trigger(EventArgs),
    GetSocketId,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Init(_) => CommandKind::Init,
            Command::Connect => CommandKind::Connect,
            Command::Disconnect => CommandKind::Disconnect,
            Command::Subscribe(_) => CommandKind::Subscribe,
            Command::Unsubscribe(_) => CommandKind::Unsubscribe,
            Command::Bind(_) => CommandKind::Bind,
            Command::Unbind(_) => CommandKind::Unbind,
            Command::Trigger(_) => CommandKind::Trigger,
            Command::GetSocketId => CommandKind::GetSocketId,
        }
    }

    /// Parse a method name and its JSON argument payload
    ///
    /// # Errors
    /// * [`BridgeError::UnsupportedCommand`] - Unknown method name
    /// * [`BridgeError::InvalidConfig`] - Malformed `init` payload
    /// * [`BridgeError::InvalidArguments`] - Malformed payload for any other command
    pub fn parse(method: &str, args: &str) -> Result<Self> {
        let kind: CommandKind = method.parse()?;
        Self::parse_kind(kind, args)
    }

    pub fn parse_kind(kind: CommandKind, args: &str) -> Result<Self> {
        let command = match kind {
            CommandKind::Init => Command::Init(InitArgs::from_json(args)?),
            CommandKind::Connect => Command::Connect,
            CommandKind::Disconnect => Command::Disconnect,
            CommandKind::GetSocketId => Command::GetSocketId,
            CommandKind::Subscribe => Command::Subscribe(channel_args(kind, args)?),
            CommandKind::Unsubscribe => Command::Unsubscribe(channel_args(kind, args)?),
            CommandKind::Bind => Command::Bind(event_args(kind, args)?),
            CommandKind::Unbind => Command::Unbind(event_args(kind, args)?),
            CommandKind::Trigger => Command::Trigger(event_args(kind, args)?),
        };
        Ok(command)
    }
}

/// Acknowledgement returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Void success
    Ack,
    /// Result of `getSocketId`
    SocketId(Option<String>),
}

impl Reply {
    /// JSON value handed back to the host (`null` for void)
    pub fn to_value(&self) -> Value {
        match self {
            Reply::Ack => Value::Null,
            Reply::SocketId(Some(id)) => Value::String(id.clone()),
            Reply::SocketId(None) => Value::Null,
        }
    }
}

fn parse_args<T: DeserializeOwned>(kind: CommandKind, args: &str) -> Result<T> {
    serde_json::from_str(args).map_err(|e| BridgeError::InvalidArguments {
        command: kind.as_str(),
        reason: e.to_string(),
    })
}

fn require_non_empty(kind: CommandKind, field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(BridgeError::InvalidArguments {
            command: kind.as_str(),
            reason: format!("{} must not be empty", field),
        });
    }
    Ok(())
}

fn channel_args(kind: CommandKind, args: &str) -> Result<ChannelArgs> {
    let parsed: ChannelArgs = parse_args(kind, args)?;
    require_non_empty(kind, "channelName", &parsed.channel_name)?;
    Ok(parsed)
}

fn event_args(kind: CommandKind, args: &str) -> Result<EventArgs> {
    let parsed: EventArgs = parse_args(kind, args)?;
    require_non_empty(kind, "channelName", &parsed.channel_name)?;
    require_non_empty(kind, "eventName", &parsed.event_name)?;
    Ok(parsed)
}
