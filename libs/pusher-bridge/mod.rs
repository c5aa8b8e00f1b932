//! # Pusher Bridge
//!
//! Multi-instance connection and channel-state manager for a Pusher-style
//! pub/sub client. Hosts drive it with JSON commands tagged by instance id
//! and read back one merged stream of channel events and connection state
//! changes.
//!
//! ## Features
//!
//! - **Independent instances**: Each id owns its own remote client, channels and bindings
//! - **Single outbound stream**: Every instance publishes into one [`EventMultiplexer`]
//! - **Pluggable transport**: The socket lives behind [`RemoteClient`]; [`LoopbackClient`] runs in-process
//! - **Channel auth**: Private and presence subscriptions are signed through [`HttpAuthorizer`]
//! - **Diagnostics**: Failures swallowed at the command boundary are reported on a side channel
//!
//! ## Example
//!
//! ```rust,ignore
//! use pusher_bridge::{InstanceManager, LoopbackFactory};
//! use std::sync::Arc;
//!
//! let manager = InstanceManager::new(Arc::new(LoopbackFactory::new()));
//! let events = manager.multiplexer().attach_channel();
//!
//! manager.dispatch("a", "init", r#"{"appKey":"key"}"#)?;
//! manager.dispatch("a", "subscribe", r#"{"channelName":"private-orders"}"#)?;
//! manager.dispatch("a", "bind", r#"{"channelName":"private-orders","eventName":"created"}"#)?;
//! manager.dispatch("a", "connect", "{}")?;
//!
//! for json in events.try_iter() {
//!     println!("{}", json);
//! }
//! ```

pub mod traits;
pub mod core;
pub mod manager;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use crate::core::{
    command, config, instance, loopback, message, multiplexer,
    auth::{AuthEncoding, HttpAuthorizer},
    bindings::{BindingKey, BindingTable},
    channels::{ChannelKind, ChannelRegistry},
    command::{Command, CommandKind, Reply},
    config::{AuthOptions, ClientOptions, ConnectionOptions, InitArgs},
    instance::{Instance, InstanceId},
    loopback::{LoopbackChannel, LoopbackClient, LoopbackFactory},
    message::{OutboundKind, OutboundMessage},
    multiplexer::{DeliveryMetrics, Diagnostic, EventMultiplexer},
};

// Re-export manager
pub use manager::InstanceManager;
