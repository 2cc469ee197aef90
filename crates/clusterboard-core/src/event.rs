//! Event bus for clusterboard using tokio::broadcast
//!
//! Notifies view layers when a cached resource settles or a preference
//! changes so they can re-read state and redraw. Reads (`get`) always
//! reflect the latest applied mutation whether or not any subscriber
//! consumes the event.

use tokio::sync::broadcast;

/// Events emitted by the data layer
#[derive(Debug, Clone)]
pub enum DataEvent {
    /// A fetch for the given resource kind/key settled successfully
    ResourceResolved { kind: &'static str, key: String },
    /// A fetch for the given resource kind/key settled with an error
    ResourceFailed { kind: &'static str, key: String },
    /// A UI preference was written
    PreferenceChanged(String),
}

/// Event bus for broadcasting data events
///
/// Uses tokio::broadcast for multi-consumer support: each view subscribes
/// independently and lagging subscribers only lose their own backlog.
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DataEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
