//! Process-wide outbound stream
//!
//! Every instance publishes into one [`EventMultiplexer`]. Delivery is
//! synchronous, best-effort and at-most-once: with no sink attached the
//! message is dropped, and nothing is buffered for a late listener.

use crate::core::instance::InstanceId;
use crate::core::message::OutboundMessage;
use crate::traits::{EventSink, Result};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Record of a failure that was swallowed at the command or callback boundary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub instance_id: InstanceId,
    /// Operation that failed (`init`, `bind`, `event`, ...)
    pub operation: &'static str,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(instance_id: InstanceId, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            instance_id,
            operation,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Delivery counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryMetrics {
    pub delivered: u64,
    pub dropped: u64,
    pub diagnostics: u64,
}

#[derive(Default)]
struct AtomicDeliveryMetrics {
    delivered: AtomicU64,
    dropped: AtomicU64,
    diagnostics: AtomicU64,
}

impl AtomicDeliveryMetrics {
    fn snapshot(&self) -> DeliveryMetrics {
        DeliveryMetrics {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            diagnostics: self.diagnostics.load(Ordering::Relaxed),
        }
    }
}

/// Single outbound sink shared by all instances
#[derive(Default)]
pub struct EventMultiplexer {
    sink: RwLock<Option<Arc<dyn EventSink>>>,
    diagnostics: RwLock<Option<Sender<Diagnostic>>>,
    metrics: AtomicDeliveryMetrics,
}

impl EventMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the listener, replacing any previous one
    pub fn attach(&self, sink: Arc<dyn EventSink>) {
        let previous = self.sink.write().replace(sink);
        if previous.is_some() {
            info!("Outbound listener replaced");
        } else {
            debug!("Outbound listener attached");
        }
    }

    /// Attach a crossbeam channel and return its receiving end
    ///
    /// The receiver is meant to be drained by a dedicated consumer thread.
    pub fn attach_channel(&self) -> Receiver<String> {
        let (tx, rx) = unbounded();
        self.attach(Arc::new(tx));
        rx
    }

    /// Attach a tokio channel and return its receiving end
    pub fn attach_async(&self) -> tokio::sync::mpsc::UnboundedReceiver<String> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        self.attach(Arc::new(tx));
        rx
    }

    /// Detach the listener
    ///
    /// Returns `true` if a listener was attached.
    pub fn detach(&self) -> bool {
        let detached = self.sink.write().take().is_some();
        if detached {
            debug!("Outbound listener detached");
        }
        detached
    }

    pub fn is_attached(&self) -> bool {
        self.sink.read().is_some()
    }

    /// Serialize and deliver one message
    ///
    /// # Returns
    /// * `Ok(true)` - Delivered to the attached sink
    /// * `Ok(false)` - Dropped (no listener, or the listener went away)
    /// * `Err(BridgeError::Serialization)` - The message could not be encoded
    pub fn publish(&self, message: &OutboundMessage) -> Result<bool> {
        // Clone out of the lock so a sink may detach from inside deliver()
        let sink = self.sink.read().as_ref().map(Arc::clone);
        let Some(sink) = sink else {
            self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(false);
        };

        let json = message.to_json()?;
        if sink.deliver(json) {
            self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
            Ok(true)
        } else {
            self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            Ok(false)
        }
    }

    /// Attach the diagnostics listener and return its receiving end
    pub fn attach_diagnostics(&self) -> Receiver<Diagnostic> {
        let (tx, rx) = unbounded();
        *self.diagnostics.write() = Some(tx);
        rx
    }

    pub fn detach_diagnostics(&self) -> bool {
        self.diagnostics.write().take().is_some()
    }

    /// Report a swallowed failure
    ///
    /// Dropped silently when no diagnostics listener is attached.
    pub fn report(&self, diagnostic: Diagnostic) -> bool {
        let tx = self.diagnostics.read().clone();
        match tx {
            Some(tx) if tx.send(diagnostic).is_ok() => {
                self.metrics.diagnostics.fetch_add(1, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// Get delivery counters
    pub fn metrics(&self) -> DeliveryMetrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ConnectionState, FnSink};
    use parking_lot::Mutex;

    fn state_message(id: &str) -> OutboundMessage {
        OutboundMessage::state_change(
            InstanceId::from(id),
            ConnectionState::Connecting,
            ConnectionState::Connected,
        )
    }

    #[test]
    fn test_publish_without_sink_drops() {
        let mux = EventMultiplexer::new();
        assert!(!mux.is_attached());
        assert!(!mux.publish(&state_message("a")).unwrap());
        assert_eq!(mux.metrics().dropped, 1);
        assert_eq!(mux.metrics().delivered, 0);
    }

    #[test]
    fn test_publish_delivers_in_order() {
        let mux = EventMultiplexer::new();
        let rx = mux.attach_channel();

        mux.publish(&state_message("a")).unwrap();
        mux.publish(&OutboundMessage::event(InstanceId::from("b"), "room", "msg", "{}"))
            .unwrap();

        let first = OutboundMessage::from_json(&rx.try_recv().unwrap()).unwrap();
        let second = OutboundMessage::from_json(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(first.instance_id.as_str(), "a");
        assert_eq!(second.instance_id.as_str(), "b");
        assert!(rx.try_recv().is_err());
        assert_eq!(mux.metrics().delivered, 2);
    }

    #[test]
    fn test_no_buffering_for_late_listener() {
        let mux = EventMultiplexer::new();
        mux.publish(&state_message("early")).unwrap();

        let rx = mux.attach_channel();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_detach_stops_delivery() {
        let mux = EventMultiplexer::new();
        let rx = mux.attach_channel();
        assert!(mux.detach());
        assert!(!mux.detach());

        assert!(!mux.publish(&state_message("a")).unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_attach_replaces_listener() {
        let mux = EventMultiplexer::new();
        let old = mux.attach_channel();
        let new = mux.attach_channel();

        mux.publish(&state_message("a")).unwrap();
        assert!(old.try_recv().is_err());
        assert!(new.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_consumer_counts_as_dropped() {
        let mux = EventMultiplexer::new();
        let rx = mux.attach_channel();
        drop(rx);

        assert!(!mux.publish(&state_message("a")).unwrap());
        assert_eq!(mux.metrics().dropped, 1);
    }

    #[test]
    fn test_sink_may_detach_during_delivery() {
        let mux = Arc::new(EventMultiplexer::new());
        let seen = Arc::new(Mutex::new(0));

        let mux_clone = Arc::clone(&mux);
        let seen_clone = Arc::clone(&seen);
        mux.attach(Arc::new(FnSink(move |_m: String| {
            *seen_clone.lock() += 1;
            mux_clone.detach();
        })));

        assert!(mux.publish(&state_message("a")).unwrap());
        assert!(!mux.publish(&state_message("a")).unwrap());
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_diagnostics() {
        let mux = EventMultiplexer::new();
        assert!(!mux.report(Diagnostic::new(InstanceId::from("a"), "init", "ignored")));

        let rx = mux.attach_diagnostics();
        assert!(mux.report(Diagnostic::new(InstanceId::from("a"), "init", "bad appKey")));

        let diagnostic = rx.try_recv().unwrap();
        assert_eq!(diagnostic.operation, "init");
        assert_eq!(diagnostic.message, "bad appKey");
        assert_eq!(mux.metrics().diagnostics, 1);

        assert!(mux.detach_diagnostics());
        assert!(!mux.report(Diagnostic::new(InstanceId::from("a"), "init", "gone")));
    }
}
