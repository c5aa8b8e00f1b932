use crate::traits::SubscriptionHandle;
use std::collections::HashMap;

/// Identity of a binding: one event on one channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey {
    pub channel: String,
    pub event: String,
}

impl BindingKey {
    pub fn new(channel: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
        }
    }
}

/// Per-instance map of (channel, event) to the remote subscription handle
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: HashMap<BindingKey, SubscriptionHandle>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handle, returning the one it replaced
    pub fn insert(&mut self, key: BindingKey, handle: SubscriptionHandle) -> Option<SubscriptionHandle> {
        self.bindings.insert(key, handle)
    }

    pub fn remove(&mut self, key: &BindingKey) -> Option<SubscriptionHandle> {
        self.bindings.remove(key)
    }

    pub fn get(&self, key: &BindingKey) -> Option<&SubscriptionHandle> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// Remove and return every binding on `channel`
    pub fn remove_channel(&mut self, channel: &str) -> Vec<(BindingKey, SubscriptionHandle)> {
        let keys: Vec<BindingKey> = self
            .bindings
            .keys()
            .filter(|key| key.channel == channel)
            .cloned()
            .collect();

        keys.into_iter()
            .filter_map(|key| self.bindings.remove(&key).map(|handle| (key, handle)))
            .collect()
    }

    /// Bound keys, sorted
    pub fn keys(&self) -> Vec<BindingKey> {
        let mut keys: Vec<BindingKey> = self.bindings.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
