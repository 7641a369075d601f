//! Persists locally edited templates into the content store.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::content::{ChangeEvent, ChangeSource};
use crate::events::{EventBus, PipelineEvent};

use super::ContentStore;
use super::error::PersistError;

/// Writes accepted local changes into the aggregate document and announces
/// each successful write with [`PipelineEvent::ContentPersisted`].
///
/// Changes that came from the database are never written back.
pub struct ContentSynchronizer {
    store: Arc<dyn ContentStore>,
    bus: EventBus,
}

impl ContentSynchronizer {
    pub fn new(store: Arc<dyn ContentStore>, bus: EventBus) -> Self {
        Self { store, bus }
    }

    /// Write every entry of `change` to the store.
    ///
    /// Entries with an empty key are skipped. `ContentPersisted` is published
    /// once, after the last write, if anything was written.
    pub async fn persist(&self, change: &ChangeEvent) -> Result<(), PersistError> {
        let mut written = 0usize;

        for (key, content) in change.entries() {
            if key.is_empty() {
                crate::debug_event!("sync", "skipped", "entry without a key");
                continue;
            }
            self.store.set_field(key, content).await?;
            crate::log_event!("sync", "persisted", "{key}");
            written += 1;
        }

        if written > 0 {
            self.bus.publish(PipelineEvent::ContentPersisted);
        }
        Ok(())
    }

    /// Persist local changes from `events` until the bus closes.
    ///
    /// Subscribe before the watcher starts so no change is missed. A failed
    /// write is logged and the loop keeps going.
    pub async fn run(self, mut events: broadcast::Receiver<PipelineEvent>) {
        loop {
            match events.recv().await {
                Ok(PipelineEvent::ContentChanged(change)) => {
                    if change.source() != ChangeSource::Local {
                        crate::debug_event!("sync", "skipped", "database change");
                        continue;
                    }
                    if let Err(e) = self.persist(&change).await {
                        tracing::error!("[sync] failed to persist change: {e}");
                    }
                }
                Ok(PipelineEvent::ContentPersisted) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[sync] fell behind, {skipped} events lost");
                }
                Err(RecvError::Closed) => break,
            }
        }

        crate::debug_event!("sync", "stopped");
    }
}
