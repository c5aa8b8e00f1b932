use crate::core::{Command, CommandKind, EventMultiplexer, Instance, InstanceId, Reply};
use crate::traits::{BridgeError, ClientFactory, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of independent instances keyed by caller-chosen id
///
/// Owns the process-wide [`EventMultiplexer`] every instance publishes into,
/// and the [`ClientFactory`] used to build a remote client on each `init`.
///
/// # Example
/// ```ignore
/// let factory = Arc::new(LoopbackFactory::new());
/// let manager = InstanceManager::new(factory);
/// let events = manager.multiplexer().attach_channel();
///
/// manager.dispatch("main", "init", r#"{"appKey":"key","options":{"cluster":"eu"}}"#)?;
/// manager.dispatch("main", "connect", "{}")?;
///
/// while let Ok(json) = events.recv() {
///     println!("{}", json);
/// }
/// ```
pub struct InstanceManager {
    instances: RwLock<HashMap<InstanceId, Arc<Instance>>>,
    factory: Arc<dyn ClientFactory>,
    multiplexer: Arc<EventMultiplexer>,
}

impl InstanceManager {
    /// Create a manager with its own multiplexer
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self::with_multiplexer(factory, Arc::new(EventMultiplexer::new()))
    }

    /// Create a manager publishing into an existing multiplexer
    pub fn with_multiplexer(
        factory: Arc<dyn ClientFactory>,
        multiplexer: Arc<EventMultiplexer>,
    ) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            factory,
            multiplexer,
        }
    }

    /// Get a reference to the shared outbound stream
    pub fn multiplexer(&self) -> &Arc<EventMultiplexer> {
        &self.multiplexer
    }

    /// Get the instance for `id`, creating it on first use
    ///
    /// Concurrent calls for the same unseen id all receive the same instance.
    /// A new instance logs nothing until an `init` enables its logging.
    pub fn resolve(&self, id: impl Into<InstanceId>) -> Arc<Instance> {
        let id = id.into();

        if let Some(instance) = self.instances.read().get(&id) {
            return Arc::clone(instance);
        }

        let mut instances = self.instances.write();
        let instance = instances.entry(id.clone()).or_insert_with(|| {
            Arc::new(Instance::new(
                id,
                Arc::clone(&self.factory),
                Arc::clone(&self.multiplexer),
            ))
        });
        Arc::clone(instance)
    }

    /// Get the instance for `id` without creating it
    pub fn get(&self, id: &InstanceId) -> Option<Arc<Instance>> {
        self.instances.read().get(id).cloned()
    }

    /// Route one command to its instance
    ///
    /// Every failure except an unknown method is logged, reported on the
    /// diagnostics stream and acknowledged as success. A malformed `init`
    /// still tears down the instance's previous client.
    ///
    /// # Arguments
    /// * `id` - Target instance (created on first use)
    /// * `method` - Command name (`init`, `subscribe`, `getSocketId`, ...)
    /// * `args` - JSON argument payload
    ///
    /// # Errors
    /// [`BridgeError::UnsupportedCommand`] for an unknown method
    pub fn dispatch(&self, id: impl Into<InstanceId>, method: &str, args: &str) -> Result<Reply> {
        let kind: CommandKind = method.parse()?;
        let instance = self.resolve(id);

        match Command::parse_kind(kind, args) {
            Ok(command) => Ok(instance.handle(command)),
            Err(e) => {
                if matches!(e, BridgeError::InvalidConfig(_)) {
                    instance.teardown();
                }
                instance.fail(kind, &e);
                Ok(Reply::Ack)
            }
        }
    }

    /// Route an already parsed command
    pub fn execute(&self, id: impl Into<InstanceId>, command: Command) -> Reply {
        self.resolve(id).handle(command)
    }

    /// Get all instance ids, sorted
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.instances.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Get the number of instances
    pub fn instance_count(&self) -> usize {
        self.instances.read().len()
    }

    /// Check if an instance exists
    pub fn has_instance(&self, id: &InstanceId) -> bool {
        self.instances.read().contains_key(id)
    }
}
