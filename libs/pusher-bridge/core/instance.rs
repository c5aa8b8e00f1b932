use crate::core::bindings::{BindingKey, BindingTable};
use crate::core::channels::{ChannelKind, ChannelRegistry};
use crate::core::command::{ChannelArgs, Command, CommandKind, EventArgs, Reply};
use crate::core::config::{ClientOptions, InitArgs};
use crate::core::message::{protocol_events, OutboundMessage};
use crate::core::multiplexer::{Diagnostic, EventMultiplexer};
use crate::traits::{
    BridgeError, ChannelHandle, ChannelListener, ClientFactory, ConnectionState,
    ConnectionStateListener, EventCallback, RemoteClient, Result,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caller-chosen identifier of one instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publishes on behalf of one instance
///
/// Shared with the remote client (as its state and channel listener) and
/// with every event callback. Holds no reference to the instance state, so nothing
/// running on a remote client thread can contend for the instance mutex.
struct Emitter {
    id: InstanceId,
    multiplexer: Arc<EventMultiplexer>,
    logging: AtomicBool,
}

impl Emitter {
    fn logging(&self) -> bool {
        self.logging.load(Ordering::Acquire)
    }

    fn set_logging(&self, enabled: bool) {
        self.logging.store(enabled, Ordering::Release);
    }

    fn publish(&self, operation: &'static str, message: OutboundMessage) {
        if let Err(e) = self.multiplexer.publish(&message) {
            self.report(operation, &e);
        }
    }

    fn report(&self, operation: &'static str, error: &BridgeError) {
        if self.logging() {
            match error {
                BridgeError::NotSubscribed(_) => {
                    debug!(instance_id = %self.id, "{} ignored: {}", operation, error)
                }
                _ => warn!(instance_id = %self.id, "{} failed: {}", operation, error),
            }
        }
        self.multiplexer
            .report(Diagnostic::new(self.id.clone(), operation, error.to_string()));
    }

    /// Callback forwarding object payloads of `event` on `channel`
    fn event_callback(self: &Arc<Self>, channel: &str, event: &str) -> EventCallback {
        let emitter = Arc::clone(self);
        let channel = channel.to_string();
        let event = event.to_string();

        Arc::new(move |payload: Value| {
            if !payload.is_object() {
                if emitter.logging() {
                    debug!(
                        instance_id = %emitter.id,
                        "Dropping non-object payload for {}/{}", channel, event
                    );
                }
                return;
            }

            match serde_json::to_string(&payload) {
                Ok(data) => emitter.publish(
                    "event",
                    OutboundMessage::event(emitter.id.clone(), channel.as_str(), event.as_str(), data),
                ),
                Err(e) => emitter.report("event", &BridgeError::from(e)),
            }
        })
    }
}

impl ConnectionStateListener for Emitter {
    fn on_state_change(&self, previous: ConnectionState, current: ConnectionState) {
        if self.logging() {
            debug!(instance_id = %self.id, "State changed: {} -> {}", previous, current);
        }
        self.publish(
            "connectionStateChange",
            OutboundMessage::state_change(self.id.clone(), previous, current),
        );
    }

    fn on_error(&self, message: &str, code: Option<&str>, exception: Option<&str>) {
        if self.logging() {
            warn!(
                instance_id = %self.id,
                code = code.unwrap_or(""),
                "Connection error: {}", message
            );
        }
        self.publish(
            "connectionError",
            OutboundMessage::connection_error(
                self.id.clone(),
                message,
                code.map(str::to_string),
                exception.map(str::to_string),
            ),
        );
    }
}

impl ChannelListener for Emitter {
    fn on_subscription_succeeded(&self, channel: &str, members: Option<Value>) {
        if self.logging() {
            debug!(instance_id = %self.id, channel = channel, "Subscription succeeded");
        }
        let data = members.map(|m| m.to_string()).unwrap_or_default();
        self.publish(
            "subscriptionSucceeded",
            OutboundMessage::event(
                self.id.clone(),
                channel,
                protocol_events::SUBSCRIPTION_SUCCEEDED,
                data,
            ),
        );
    }

    fn on_member_added(&self, channel: &str, user_id: &str) {
        if self.logging() {
            debug!(instance_id = %self.id, channel = channel, user_id = user_id, "Member added");
        }
        self.publish(
            "memberAdded",
            OutboundMessage::member_event(
                self.id.clone(),
                channel,
                protocol_events::MEMBER_ADDED,
                user_id,
            ),
        );
    }

    fn on_member_removed(&self, channel: &str, user_id: &str) {
        if self.logging() {
            debug!(instance_id = %self.id, channel = channel, user_id = user_id, "Member removed");
        }
        self.publish(
            "memberRemoved",
            OutboundMessage::member_event(
                self.id.clone(),
                channel,
                protocol_events::MEMBER_REMOVED,
                user_id,
            ),
        );
    }
}

#[derive(Default)]
struct InstanceState {
    client: Option<Arc<dyn RemoteClient>>,
    app_key: Option<String>,
    options: Option<ClientOptions>,
    channels: ChannelRegistry,
    bindings: BindingTable,
}

/// One logical pub/sub session
///
/// Owns at most one remote client plus the channels and bindings created
/// through it. Commands run on caller threads; events arrive on the remote
/// client's threads and go straight to the multiplexer.
pub struct Instance {
    id: InstanceId,
    factory: Arc<dyn ClientFactory>,
    emitter: Arc<Emitter>,
    state: Mutex<InstanceState>,
}

impl Instance {
    pub fn new(
        id: InstanceId,
        factory: Arc<dyn ClientFactory>,
        multiplexer: Arc<EventMultiplexer>,
    ) -> Self {
        let emitter = Arc::new(Emitter {
            id: id.clone(),
            multiplexer,
            logging: AtomicBool::new(false),
        });
        Self {
            id,
            factory,
            emitter,
            state: Mutex::new(InstanceState::default()),
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    /// Run a command, swallowing and reporting failures
    pub fn handle(&self, command: Command) -> Reply {
        let kind = command.kind();
        match self.execute(command) {
            Ok(reply) => reply,
            Err(e) => {
                self.fail(kind, &e);
                Reply::Ack
            }
        }
    }

    /// Run a command, returning its failure
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Init(args) => self.init(args)?,
            Command::Connect => self.connect(),
            Command::Disconnect => self.disconnect(),
            Command::Subscribe(ChannelArgs { channel_name }) => self.subscribe(&channel_name),
            Command::Unsubscribe(ChannelArgs { channel_name }) => self.unsubscribe(&channel_name),
            Command::Bind(EventArgs {
                channel_name,
                event_name,
            }) => self.bind(&channel_name, &event_name)?,
            Command::Unbind(EventArgs {
                channel_name,
                event_name,
            }) => self.unbind(&channel_name, &event_name),
            Command::Trigger(EventArgs {
                channel_name,
                event_name,
            }) => self.trigger(&channel_name, &event_name)?,
            Command::GetSocketId => return Ok(Reply::SocketId(self.socket_id())),
        }
        Ok(Reply::Ack)
    }

    /// Log and report a swallowed command failure
    pub fn fail(&self, kind: CommandKind, error: &BridgeError) {
        self.emitter.report(kind.as_str(), error);
    }

    /// Replace the remote client
    ///
    /// The previous client is torn down (callbacks and subscriptions dropped)
    /// but not disconnected.
    pub fn init(&self, args: InitArgs) -> Result<()> {
        self.emitter.set_logging(args.is_logging_enabled);
        self.teardown();

        let options = ClientOptions::resolve(&args.options, args.is_logging_enabled)?;
        let client = self.factory.create(&args.app_key, &options)?;
        client.set_state_listener(Arc::clone(&self.emitter) as Arc<dyn ConnectionStateListener>);

        if self.logging_enabled() {
            info!(
                instance_id = %self.id,
                host = %options.host,
                port = options.port,
                encrypted = options.encrypted,
                auth = options.has_authorizer(),
                "Client initialized"
            );
        }

        let mut state = self.state.lock();
        state.client = Some(client);
        state.app_key = Some(args.app_key);
        state.options = Some(options);
        Ok(())
    }

    /// Drop every callback and subscription and clear local tables
    pub fn teardown(&self) {
        let (client, channels) = {
            let mut state = self.state.lock();
            state.bindings.clear();
            (state.client.clone(), state.channels.drain())
        };

        if let Some(client) = client {
            client.unbind_all();
            client.unsubscribe_all();
        }
        for (_, channel) in channels {
            channel.handle.unbind_all();
        }
    }

    pub fn connect(&self) {
        let Some(client) = self.client() else {
            self.log_uninitialized("connect");
            return;
        };
        if self.logging_enabled() {
            info!(instance_id = %self.id, "connect");
        }
        client.connect();
    }

    pub fn disconnect(&self) {
        let Some(client) = self.client() else {
            self.log_uninitialized("disconnect");
            return;
        };
        if self.logging_enabled() {
            info!(instance_id = %self.id, "disconnect");
        }
        client.disconnect();
    }

    pub fn subscribe(&self, channel_name: &str) {
        let Some(client) = self.client() else {
            self.log_uninitialized("subscribe");
            return;
        };

        let kind = ChannelKind::from_name(channel_name);
        if self.logging_enabled() {
            info!(instance_id = %self.id, channel = channel_name, "subscribe ({})", kind);
        }

        let listener = Arc::clone(&self.emitter) as Arc<dyn ChannelListener>;
        let handle = match kind {
            ChannelKind::Public => client.subscribe(channel_name, listener),
            ChannelKind::Private => client.subscribe_private(channel_name, listener),
            ChannelKind::Presence => client.subscribe_to_presence(channel_name, listener),
        };

        // A fresh handle orphans the bindings made through the old one
        let stale = {
            let mut state = self.state.lock();
            let replaced = state.channels.insert(channel_name, kind, Arc::clone(&handle));
            match replaced {
                Some(previous) if !Arc::ptr_eq(&previous.handle, &handle) => {
                    Some((previous.handle, state.bindings.remove_channel(channel_name)))
                }
                _ => None,
            }
        };

        if let Some((previous, bindings)) = stale {
            for (key, subscription) in bindings {
                previous.unbind(&key.event, &subscription);
            }
        }
    }

    /// Drop a subscription and every binding made on it
    pub fn unsubscribe(&self, channel_name: &str) {
        let Some(client) = self.client() else {
            self.log_uninitialized("unsubscribe");
            return;
        };
        if self.logging_enabled() {
            info!(instance_id = %self.id, channel = channel_name, "unsubscribe");
        }

        let (channel, bindings) = {
            let mut state = self.state.lock();
            (
                state.channels.remove(channel_name),
                state.bindings.remove_channel(channel_name),
            )
        };

        if let Some(channel) = channel {
            for (key, handle) in bindings {
                channel.handle.unbind(&key.event, &handle);
            }
        }
        client.unsubscribe(channel_name);
    }

    /// Forward `event_name` on `channel_name` to the outbound stream
    ///
    /// # Errors
    /// [`BridgeError::NotSubscribed`] when the channel has no live subscription
    pub fn bind(&self, channel_name: &str, event_name: &str) -> Result<()> {
        let key = BindingKey::new(channel_name, event_name);
        let mut state = self.state.lock();

        let Some(handle) = state.channels.handle(channel_name) else {
            return Err(BridgeError::NotSubscribed(channel_name.to_string()));
        };

        if let Some(previous) = state.bindings.remove(&key) {
            handle.unbind(event_name, &previous);
        }

        let callback = self.emitter.event_callback(channel_name, event_name);
        let subscription = handle.bind(event_name, callback);
        state.bindings.insert(key, subscription);

        if self.logging_enabled() {
            info!(instance_id = %self.id, channel = channel_name, event = event_name, "bind");
        }
        Ok(())
    }

    pub fn unbind(&self, channel_name: &str, event_name: &str) {
        let key = BindingKey::new(channel_name, event_name);
        let mut state = self.state.lock();

        let Some(subscription) = state.bindings.remove(&key) else {
            return;
        };
        if let Some(handle) = state.channels.handle(channel_name) {
            handle.unbind(event_name, &subscription);
        }

        if self.logging_enabled() {
            info!(instance_id = %self.id, channel = channel_name, event = event_name, "unbind");
        }
    }

    /// Publish a client event with an empty payload
    ///
    /// # Errors
    /// [`BridgeError::NotSubscribed`] when the channel has no live subscription
    pub fn trigger(&self, channel_name: &str, event_name: &str) -> Result<()> {
        let handle = self.state.lock().channels.handle(channel_name);
        let Some(handle) = handle else {
            return Err(BridgeError::NotSubscribed(channel_name.to_string()));
        };

        if self.logging_enabled() {
            info!(instance_id = %self.id, channel = channel_name, event = event_name, "trigger");
        }
        handle.trigger(event_name, json!({}));
        Ok(())
    }

    /// Socket id of the current connection, if any
    pub fn socket_id(&self) -> Option<String> {
        self.client().and_then(|client| client.socket_id())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().client.is_some()
    }

    pub fn logging_enabled(&self) -> bool {
        self.emitter.logging()
    }

    pub fn app_key(&self) -> Option<String> {
        self.state.lock().app_key.clone()
    }

    /// Options resolved by the last successful `init`
    pub fn options(&self) -> Option<ClientOptions> {
        self.state.lock().options.clone()
    }

    /// Subscribed channel names, sorted
    pub fn channel_names(&self) -> Vec<String> {
        self.state.lock().channels.names()
    }

    pub fn is_subscribed(&self, channel_name: &str) -> bool {
        self.state.lock().channels.contains(channel_name)
    }

    pub fn channel_kind(&self, channel_name: &str) -> Option<ChannelKind> {
        self.state.lock().channels.get(channel_name).map(|c| c.kind)
    }

    pub fn is_bound(&self, channel_name: &str, event_name: &str) -> bool {
        self.state
            .lock()
            .bindings
            .contains(&BindingKey::new(channel_name, event_name))
    }

    /// Bound (channel, event) pairs, sorted
    pub fn bindings(&self) -> Vec<BindingKey> {
        self.state.lock().bindings.keys()
    }

    pub fn binding_count(&self) -> usize {
        self.state.lock().bindings.len()
    }

    fn client(&self) -> Option<Arc<dyn RemoteClient>> {
        self.state.lock().client.clone()
    }

    fn log_uninitialized(&self, operation: &str) {
        if self.logging_enabled() {
            debug!(instance_id = %self.id, "{} ignored: instance not initialized", operation);
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("logging_enabled", &self.logging_enabled())
            .finish_non_exhaustive()
    }
}
