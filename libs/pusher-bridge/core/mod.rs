//! Instance state, command handling and the outbound stream

pub mod auth;
pub mod bindings;
pub mod channels;
pub mod command;
pub mod config;
pub mod instance;
pub mod loopback;
pub mod message;
pub mod multiplexer;

// Re-export main types
pub use auth::{AuthEncoding, HttpAuthorizer};
pub use bindings::{BindingKey, BindingTable};
pub use channels::{ChannelKind, ChannelRegistry, RegisteredChannel};
pub use command::{ChannelArgs, Command, CommandKind, EventArgs, Reply};
pub use config::{AuthOptions, ClientOptions, ConnectionOptions, InitArgs};
pub use instance::{Instance, InstanceId};
pub use loopback::{LoopbackChannel, LoopbackClient, LoopbackFactory};
pub use message::{
    protocol_events, ChannelEvent, ConnectionError, ConnectionStateChange, OutboundKind,
    OutboundMessage, CHANNEL_ERROR_CODE,
};
pub use multiplexer::{DeliveryMetrics, Diagnostic, EventMultiplexer};
