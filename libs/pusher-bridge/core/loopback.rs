//! In-process remote client
//!
//! [`LoopbackClient`] implements [`RemoteClient`] without a network. State
//! transitions, inbound events, presence membership and errors are driven by
//! the caller. It is the client behind the stdio harness and the test suite.

use crate::core::channels::ChannelKind;
use crate::core::config::ClientOptions;
use crate::core::message::CHANNEL_ERROR_CODE;
use crate::traits::{
    ChannelHandle, ChannelListener, ClientFactory, ConnectionState, ConnectionStateListener,
    EventCallback, RemoteClient, Result, SubscriptionHandle,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A channel on a [`LoopbackClient`]
pub struct LoopbackChannel {
    name: String,
    kind: ChannelKind,
    callbacks: Mutex<HashMap<String, Vec<(SubscriptionHandle, EventCallback)>>>,
    triggered: Mutex<Vec<(String, Value)>>,
    members: Mutex<BTreeSet<String>>,
    next_handle: AtomicU64,
    authorized: bool,
    listener: Arc<dyn ChannelListener>,
}

impl LoopbackChannel {
    fn new(
        name: &str,
        kind: ChannelKind,
        authorized: bool,
        listener: Arc<dyn ChannelListener>,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            callbacks: Mutex::new(HashMap::new()),
            triggered: Mutex::new(Vec::new()),
            members: Mutex::new(BTreeSet::new()),
            next_handle: AtomicU64::new(1),
            authorized,
            listener,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Whether the subscription passed authorization
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Invoke every callback bound to `event`
    ///
    /// Returns the number of callbacks invoked.
    pub fn deliver(&self, event: &str, payload: Value) -> usize {
        // Callbacks run without the table lock held
        let callbacks: Vec<EventCallback> = self
            .callbacks
            .lock()
            .get(event)
            .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in &callbacks {
            callback(payload.clone());
        }
        callbacks.len()
    }

    pub fn callback_count(&self, event: &str) -> usize {
        self.callbacks.lock().get(event).map_or(0, Vec::len)
    }

    /// Client events published through [`ChannelHandle::trigger`]
    pub fn triggered(&self) -> Vec<(String, Value)> {
        self.triggered.lock().clone()
    }

    /// Current presence members, sorted
    pub fn members(&self) -> Vec<String> {
        self.members.lock().iter().cloned().collect()
    }

    /// Confirm the subscription to the channel listener
    ///
    /// Presence channels pass their member list along.
    fn succeed(&self) {
        let members = match self.kind {
            ChannelKind::Presence => Some(json!(self.members())),
            _ => None,
        };
        self.listener.on_subscription_succeeded(&self.name, members);
    }

    fn accepts_members(&self) -> bool {
        self.kind == ChannelKind::Presence && self.authorized
    }
}

impl ChannelHandle for LoopbackChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&self, event: &str, callback: EventCallback) -> SubscriptionHandle {
        let n = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let handle = SubscriptionHandle::new(format!("{}#{}", self.name, n));
        self.callbacks
            .lock()
            .entry(event.to_string())
            .or_default()
            .push((handle.clone(), callback));
        handle
    }

    fn unbind(&self, event: &str, handle: &SubscriptionHandle) {
        let mut callbacks = self.callbacks.lock();
        if let Some(entries) = callbacks.get_mut(event) {
            entries.retain(|(h, _)| h != handle);
            if entries.is_empty() {
                callbacks.remove(event);
            }
        }
    }

    fn unbind_all(&self) {
        self.callbacks.lock().clear();
    }

    fn trigger(&self, event: &str, payload: Value) {
        self.triggered.lock().push((event.to_string(), payload));
    }
}

struct LoopbackState {
    state: ConnectionState,
    socket_id: Option<String>,
    listener: Option<Arc<dyn ConnectionStateListener>>,
    channels: HashMap<String, Arc<LoopbackChannel>>,
}

/// In-process [`RemoteClient`]
pub struct LoopbackClient {
    app_key: String,
    options: ClientOptions,
    sequence: u64,
    connections: AtomicU64,
    inner: Mutex<LoopbackState>,
}

impl LoopbackClient {
    pub fn new(app_key: &str, options: ClientOptions) -> Self {
        Self::with_sequence(app_key, options, 1)
    }

    /// Create a client whose socket ids start with `sequence`
    pub fn with_sequence(app_key: &str, options: ClientOptions, sequence: u64) -> Self {
        Self {
            app_key: app_key.to_string(),
            options,
            sequence,
            connections: AtomicU64::new(0),
            inner: Mutex::new(LoopbackState {
                state: ConnectionState::Initialized,
                socket_id: None,
                listener: None,
                channels: HashMap::new(),
            }),
        }
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Move to `next`, notifying the listener
    pub fn transition(&self, next: ConnectionState) {
        let (previous, listener) = {
            let mut inner = self.inner.lock();
            let previous = inner.state;
            inner.state = next;
            (previous, inner.listener.clone())
        };
        if let Some(listener) = listener {
            listener.on_state_change(previous, next);
        }
    }

    /// Raise a connection error on the listener
    pub fn fail(&self, message: &str, code: Option<&str>) {
        let listener = self.inner.lock().listener.clone();
        if let Some(listener) = listener {
            listener.on_error(message, code, None);
        }
    }

    /// Deliver an inbound event on `channel`
    ///
    /// Returns `false` if the channel is not subscribed.
    pub fn deliver(&self, channel: &str, event: &str, payload: Value) -> bool {
        match self.channel(channel) {
            Some(channel) => {
                channel.deliver(event, payload);
                true
            }
            None => false,
        }
    }

    /// A member joins presence channel `channel`
    ///
    /// Returns `false` if the channel is not an authorized presence
    /// subscription or the member is already present.
    pub fn member_added(&self, channel: &str, user_id: &str) -> bool {
        let Some(channel) = self.channel(channel).filter(|c| c.accepts_members()) else {
            return false;
        };
        if !channel.members.lock().insert(user_id.to_string()) {
            return false;
        }
        channel.listener.on_member_added(&channel.name, user_id);
        true
    }

    /// A member leaves presence channel `channel`
    ///
    /// Returns `false` if the member was not present.
    pub fn member_removed(&self, channel: &str, user_id: &str) -> bool {
        let Some(channel) = self.channel(channel).filter(|c| c.accepts_members()) else {
            return false;
        };
        if !channel.members.lock().remove(user_id) {
            return false;
        }
        channel.listener.on_member_removed(&channel.name, user_id);
        true
    }

    pub fn channel(&self, name: &str) -> Option<Arc<LoopbackChannel>> {
        self.inner.lock().channels.get(name).cloned()
    }

    pub fn is_subscribed(&self, name: &str) -> bool {
        self.inner.lock().channels.contains_key(name)
    }

    /// Subscribed channel names, sorted
    pub fn subscribed_channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().channels.keys().cloned().collect();
        names.sort();
        names
    }

    fn subscribe_kind(
        &self,
        name: &str,
        kind: ChannelKind,
        listener: Arc<dyn ChannelListener>,
    ) -> Arc<dyn ChannelHandle> {
        if let Some(existing) = self.channel(name) {
            return existing;
        }

        let authorized = !kind.requires_auth() || self.authorize(name);
        let channel = Arc::new(LoopbackChannel::new(name, kind, authorized, listener));
        let connected = {
            let mut inner = self.inner.lock();
            inner.channels.insert(name.to_string(), Arc::clone(&channel));
            inner.state.is_connected()
        };

        if connected && authorized {
            channel.succeed();
        }
        channel
    }

    fn authorize(&self, name: &str) -> bool {
        let socket_id = self.socket_id().unwrap_or_default();
        let request = self
            .options
            .authorizer
            .as_ref()
            .and_then(|authorizer| authorizer.request_for(&socket_id, name));

        if request.is_some() {
            return true;
        }
        debug!(channel = name, "Loopback subscription refused");
        self.fail(
            &format!("Unable to authorize channel '{}'", name),
            Some(CHANNEL_ERROR_CODE),
        );
        false
    }
}

impl RemoteClient for LoopbackClient {
    fn connect(&self) {
        self.transition(ConnectionState::Connecting);

        let n = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
        let mut channels: Vec<Arc<LoopbackChannel>> = {
            let mut inner = self.inner.lock();
            inner.socket_id = Some(format!("{}.{}", self.sequence, n));
            inner.channels.values().cloned().collect()
        };
        channels.sort_by(|a, b| a.name.cmp(&b.name));

        self.transition(ConnectionState::Connected);
        for channel in channels.iter().filter(|c| c.is_authorized()) {
            channel.succeed();
        }
    }

    fn disconnect(&self) {
        self.transition(ConnectionState::Disconnecting);
        self.inner.lock().socket_id = None;
        self.transition(ConnectionState::Disconnected);
    }

    fn subscribe(&self, channel: &str, listener: Arc<dyn ChannelListener>) -> Arc<dyn ChannelHandle> {
        self.subscribe_kind(channel, ChannelKind::Public, listener)
    }

    fn subscribe_private(
        &self,
        channel: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> Arc<dyn ChannelHandle> {
        self.subscribe_kind(channel, ChannelKind::Private, listener)
    }

    fn subscribe_to_presence(
        &self,
        channel: &str,
        listener: Arc<dyn ChannelListener>,
    ) -> Arc<dyn ChannelHandle> {
        self.subscribe_kind(channel, ChannelKind::Presence, listener)
    }

    fn unsubscribe(&self, channel: &str) {
        let removed = self.inner.lock().channels.remove(channel);
        if let Some(removed) = removed {
            removed.unbind_all();
        }
    }

    fn unbind_all(&self) {
        let channels: Vec<Arc<LoopbackChannel>> =
            self.inner.lock().channels.values().cloned().collect();
        for channel in channels {
            channel.unbind_all();
        }
    }

    fn unsubscribe_all(&self) {
        self.inner.lock().channels.clear();
    }

    fn set_state_listener(&self, listener: Arc<dyn ConnectionStateListener>) {
        self.inner.lock().listener = Some(listener);
    }

    fn socket_id(&self) -> Option<String> {
        self.inner.lock().socket_id.clone()
    }
}

/// [`ClientFactory`] producing [`LoopbackClient`]s
///
/// Keeps every client it created so tests and the harness can drive them.
#[derive(Default)]
pub struct LoopbackFactory {
    clients: Mutex<Vec<Arc<LoopbackClient>>>,
}

impl LoopbackFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently created client
    pub fn latest(&self) -> Option<Arc<LoopbackClient>> {
        self.clients.lock().last().cloned()
    }

    pub fn clients(&self) -> Vec<Arc<LoopbackClient>> {
        self.clients.lock().clone()
    }

    /// Most recently created client for `app_key`
    pub fn find(&self, app_key: &str) -> Option<Arc<LoopbackClient>> {
        self.clients
            .lock()
            .iter()
            .rev()
            .find(|client| client.app_key() == app_key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

impl ClientFactory for LoopbackFactory {
    fn create(&self, app_key: &str, options: &ClientOptions) -> Result<Arc<dyn RemoteClient>> {
        let mut clients = self.clients.lock();
        let sequence = clients.len() as u64 + 1;
        let client = Arc::new(LoopbackClient::with_sequence(app_key, options.clone(), sequence));
        clients.push(Arc::clone(&client));
        Ok(client)
    }
}
