//! In-process broadcast hub for engine events.
//!
//! A single broadcast channel; every subscriber sees every event. A
//! lagging subscriber drops its own backlog without affecting others.

use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventHub<T: Clone> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> EventHub<T> {
    /// Create a hub with default capacity (256 buffered events per
    /// subscriber).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event. No-op if nobody is subscribed.
    pub fn emit(&self, event: T) {
        // Ignore send errors (no active receivers)
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}
