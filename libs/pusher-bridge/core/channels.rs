use crate::traits::ChannelHandle;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Channel classification derived from the name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Public,
    Private,
    Presence,
}

impl ChannelKind {
    /// Classify by the first `-`-separated segment of the name
    ///
    /// `private-encrypted-*` channels classify as [`ChannelKind::Private`].
    pub fn from_name(name: &str) -> Self {
        match name.split('-').next() {
            Some("private") => ChannelKind::Private,
            Some("presence") => ChannelKind::Presence,
            _ => ChannelKind::Public,
        }
    }

    /// Whether subscriptions need a signed auth request
    pub fn requires_auth(&self) -> bool {
        !matches!(self, ChannelKind::Public)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Public => "public",
            ChannelKind::Private => "private",
            ChannelKind::Presence => "presence",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live subscription held by one instance
#[derive(Clone)]
pub struct RegisteredChannel {
    pub kind: ChannelKind,
    pub handle: Arc<dyn ChannelHandle>,
}

/// Per-instance map of channel name to channel handle
#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, RegisteredChannel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a subscription, returning the entry it replaced
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        kind: ChannelKind,
        handle: Arc<dyn ChannelHandle>,
    ) -> Option<RegisteredChannel> {
        self.channels
            .insert(name.into(), RegisteredChannel { kind, handle })
    }

    /// Remove the entry for `name`
    pub fn remove(&mut self, name: &str) -> Option<RegisteredChannel> {
        self.channels.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredChannel> {
        self.channels.get(name)
    }

    /// Channel handle for `name`, if subscribed
    pub fn handle(&self, name: &str) -> Option<Arc<dyn ChannelHandle>> {
        self.channels.get(name).map(|c| Arc::clone(&c.handle))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Subscribed channel names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove and return every entry
    pub fn drain(&mut self) -> Vec<(String, RegisteredChannel)> {
        self.channels.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{EventCallback, SubscriptionHandle};
    use serde_json::Value;

    struct StubChannel(String);

    impl ChannelHandle for StubChannel {
        fn name(&self) -> &str {
            &self.0
        }
        fn bind(&self, event: &str, _callback: EventCallback) -> SubscriptionHandle {
            SubscriptionHandle::new(format!("{}:{}", self.0, event))
        }
        fn unbind(&self, _event: &str, _handle: &SubscriptionHandle) {}
        fn unbind_all(&self) {}
        fn trigger(&self, _event: &str, _payload: Value) {}
    }

    fn stub(name: &str) -> Arc<dyn ChannelHandle> {
        Arc::new(StubChannel(name.to_string()))
    }

    #[test]
    fn test_channel_kind_from_name() {
        assert_eq!(ChannelKind::from_name("private-orders"), ChannelKind::Private);
        assert_eq!(ChannelKind::from_name("private-encrypted-x"), ChannelKind::Private);
        assert_eq!(ChannelKind::from_name("presence-lobby"), ChannelKind::Presence);
        assert_eq!(ChannelKind::from_name("room-1"), ChannelKind::Public);
        assert_eq!(ChannelKind::from_name("news"), ChannelKind::Public);
        assert_eq!(ChannelKind::from_name("privateroom"), ChannelKind::Public);
        assert_eq!(ChannelKind::from_name(""), ChannelKind::Public);
    }

    #[test]
    fn test_requires_auth() {
        assert!(ChannelKind::Private.requires_auth());
        assert!(ChannelKind::Presence.requires_auth());
        assert!(!ChannelKind::Public.requires_auth());
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = ChannelRegistry::new();
        assert!(registry.insert("room-1", ChannelKind::Public, stub("room-1")).is_none());
        let replaced = registry.insert("room-1", ChannelKind::Public, stub("room-1"));
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_uses_supplied_name() {
        let mut registry = ChannelRegistry::new();
        registry.insert("private-orders", ChannelKind::Private, stub("private-orders"));
        registry.insert("news", ChannelKind::Public, stub("news"));

        assert!(registry.remove("channelName").is_none());
        assert!(registry.remove("private-orders").is_some());
        assert_eq!(registry.names(), vec!["news".to_string()]);
    }

    #[test]
    fn test_drain_empties() {
        let mut registry = ChannelRegistry::new();
        registry.insert("a", ChannelKind::Public, stub("a"));
        registry.insert("presence-b", ChannelKind::Presence, stub("presence-b"));

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.handle("a").is_none());
    }
}
