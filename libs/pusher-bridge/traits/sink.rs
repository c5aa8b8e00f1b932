/// Destination for serialized outbound messages
///
/// The multiplexer calls [`deliver`](EventSink::deliver) synchronously on
/// whichever thread produced the message, so implementations should hand the
/// string off quickly (a channel send) rather than do work inline.
pub trait EventSink: Send + Sync {
    /// Deliver one serialized message
    ///
    /// # Returns
    /// * `true` - The message was accepted
    /// * `false` - The consumer is gone; the message is lost
    fn deliver(&self, message: String) -> bool;
}

impl EventSink for crossbeam_channel::Sender<String> {
    fn deliver(&self, message: String) -> bool {
        self.send(message).is_ok()
    }
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<String> {
    fn deliver(&self, message: String) -> bool {
        self.send(message).is_ok()
    }
}

/// Adapter turning a closure into an [`EventSink`]
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(String) + Send + Sync,
{
    fn deliver(&self, message: String) -> bool {
        (self.0)(message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_crossbeam_sink() {
        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        assert!(tx.deliver("hello".to_string()));
        assert_eq!(rx.try_recv().unwrap(), "hello");

        drop(rx);
        assert!(!tx.deliver("lost".to_string()));
    }

    #[test]
    fn test_fn_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = FnSink(move |m: String| seen_clone.lock().push(m));

        assert!(sink.deliver("a".to_string()));
        assert!(sink.deliver("b".to_string()));
        assert_eq!(*seen.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_tokio_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        assert!(tx.deliver("async".to_string()));
        assert_eq!(rx.recv().await.unwrap(), "async");
    }
}
