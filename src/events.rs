//! In-process event bus shared by the watcher, the synchronizer, the
//! change-stream listener and the site updater.

use tokio::sync::broadcast;

use crate::content::ChangeEvent;

/// Everything that travels on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// New content for one or more keys, from disk or from the database.
    ContentChanged(ChangeEvent),
    /// A local change reached the database.
    ContentPersisted,
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::ContentChanged(_) => "content-changed",
            PipelineEvent::ContentPersisted => "content-persisted",
        }
    }
}

/// Broadcast channel every component publishes to and subscribes from.
///
/// Each subscriber sees events in publication order. A subscriber that falls
/// more than `capacity` events behind loses the oldest ones and is told how
/// many through `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a new bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all current subscribers
    pub fn publish(&self, event: PipelineEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(count) => {
                crate::debug_event!("bus", "sent", "{name} to {count} subscribers");
            }
            Err(_) => {
                // No receivers, this is fine
                crate::debug_event!("bus", "dropped", "no subscribers for {name}");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
