//! Remote client contract
//!
//! The bridge never speaks the pub/sub wire protocol itself. Everything that
//! touches a socket lives behind these traits, implemented by the messaging
//! client library the host links in (or by [`crate::core::LoopbackClient`]).

use crate::core::ClientOptions;
use crate::traits::error::Result;
use crate::traits::state::ConnectionStateListener;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callback registered on a channel for one event name
///
/// Invoked on the remote client's delivery thread with the raw event payload.
pub type EventCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Opaque handle returned by [`ChannelHandle::bind`], needed to unbind later
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub String);

impl SubscriptionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subscribed channel on the remote client
pub trait ChannelHandle: Send + Sync {
    /// Channel name as subscribed
    fn name(&self) -> &str;

    /// Register a callback for `event`, returning a handle for [`unbind`](Self::unbind)
    fn bind(&self, event: &str, callback: EventCallback) -> SubscriptionHandle;

    /// Remove a single callback previously returned by [`bind`](Self::bind)
    fn unbind(&self, event: &str, handle: &SubscriptionHandle);

    /// Remove every callback registered on this channel
    fn unbind_all(&self);

    /// Publish a client-originated event on this channel
    ///
    /// Whether the remote service accepts it (client events are normally
    /// limited to private and presence channels) is up to the remote side.
    fn trigger(&self, event: &str, payload: Value);
}

/// Channel-level notifications raised by the remote client
///
/// Installed with every subscription. Unlike [`EventCallback`]s these fire
/// without any `bind`: subscription confirmation and presence membership
/// changes always reach the host.
pub trait ChannelListener: Send + Sync {
    /// The server confirmed the subscription
    ///
    /// `members` carries the current member list for presence channels.
    fn on_subscription_succeeded(&self, channel: &str, members: Option<Value>);

    /// A member joined a presence channel
    fn on_member_added(&self, _channel: &str, _user_id: &str) {}

    /// A member left a presence channel
    fn on_member_removed(&self, _channel: &str, _user_id: &str) {}
}

/// A pub/sub connection to the remote service
///
/// All methods return immediately; connection progress is reported later
/// through the registered [`ConnectionStateListener`].
pub trait RemoteClient: Send + Sync {
    /// Request the connection be established
    fn connect(&self);

    /// Request the connection be torn down
    fn disconnect(&self);

    /// Subscribe to a public channel
    fn subscribe(&self, channel: &str, listener: Arc<dyn ChannelListener>)
        -> Arc<dyn ChannelHandle>;

    /// Subscribe to a private channel (authorized through the configured authorizer)
    fn subscribe_private(
        &self,
        channel: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> Arc<dyn ChannelHandle> {
        self.subscribe(channel, listener)
    }

    /// Subscribe to a presence channel
    fn subscribe_to_presence(
        &self,
        channel: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> Arc<dyn ChannelHandle>;

    /// Drop a channel subscription
    fn unsubscribe(&self, channel: &str);

    /// Remove every global and per-channel callback
    fn unbind_all(&self);

    /// Drop every channel subscription
    fn unsubscribe_all(&self);

    /// Install the listener for connection state changes, replacing any previous one
    fn set_state_listener(&self, listener: Arc<dyn ConnectionStateListener>);

    /// Socket id assigned by the server, once connected
    fn socket_id(&self) -> Option<String>;
}

/// Constructs remote clients on `init`
pub trait ClientFactory: Send + Sync {
    fn create(&self, app_key: &str, options: &ClientOptions) -> Result<Arc<dyn RemoteClient>>;
}

impl<F> ClientFactory for F
where
    F: Fn(&str, &ClientOptions) -> Result<Arc<dyn RemoteClient>> + Send + Sync,
{
    fn create(&self, app_key: &str, options: &ClientOptions) -> Result<Arc<dyn RemoteClient>> {
        self(app_key, options)
    }
}
