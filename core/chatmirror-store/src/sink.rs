//! Notification sinks: where collections publish their change events.
//!
//! Collections publish while holding their write lock, so a sink must not
//! call back into the store.

use chatmirror_types::ModelEvent;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Receives every notification a collection emits, in emission order.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ModelEvent);
}

/// Fans notifications out to any number of presentation-side receivers.
///
/// Receivers that fall more than the channel capacity behind observe
/// `RecvError::Lagged` and must reload the affected streams.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<ModelEvent>,
}

impl BroadcastSink {
    /// Creates a sink buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes a new receiver. It sees events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: ModelEvent) {
        // Publishing with no receivers attached is fine.
        let _ = self.tx.send(event);
    }
}

/// Records notifications in memory for hosts without a presentation layer.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ModelEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every recorded event.
    pub fn take(&self) -> Vec<ModelEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Copies the recorded events.
    pub fn events(&self) -> Vec<ModelEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: ModelEvent) {
        self.events.lock().push(event);
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: ModelEvent) {}
}
