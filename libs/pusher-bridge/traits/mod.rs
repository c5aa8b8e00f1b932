//! # Bridge Traits
//!
//! Seams between the bridge and the outside world:
//!
//! - **RemoteClient / ChannelHandle**: the pub/sub connection collaborator
//! - **ClientFactory**: builds a fresh remote client on every `init`
//! - **ConnectionStateListener**: receives connection transitions and errors
//! - **ChannelListener**: receives subscription confirmations and presence membership
//! - **ChannelAuthorizer**: signs private and presence subscriptions
//! - **EventSink**: receives the serialized outbound stream

pub mod auth;
pub mod error;
pub mod remote;
pub mod sink;
pub mod state;

// Re-export commonly used types
pub use auth::{AuthResponse, ChannelAuthorizer, Headers};
pub use error::{BridgeError, Result};
pub use remote::{
    ChannelHandle, ChannelListener, ClientFactory, EventCallback, RemoteClient, SubscriptionHandle,
};
pub use sink::{EventSink, FnSink};
pub use state::{ConnectionState, ConnectionStateListener};
