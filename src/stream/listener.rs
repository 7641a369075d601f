use futures_util::{Stream, StreamExt};
use mongodb::Collection;
use mongodb::bson::{Document, doc};

use crate::content::{ChangeEvent, ChangeSource};
use crate::events::{EventBus, PipelineEvent};
use crate::storage::StorageError;

use super::change::ChangeRecord;

/// Lifecycle of a [`ChangeStreamListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Connecting,
    Watching,
    /// Terminal. The listener does not reconnect.
    Failed,
}

/// Turns change stream notifications on the content collection into
/// database-sourced [`ChangeEvent`]s.
///
/// Each notification becomes a single event carrying every string field it
/// changed, so a large replace costs one bus slot and one registry refresh.
pub struct ChangeStreamListener {
    bus: EventBus,
    state: ListenerState,
    published: usize,
}

impl ChangeStreamListener {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            state: ListenerState::Connecting,
            published: 0,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Change events published so far. One per notification with fields.
    pub fn published(&self) -> usize {
        self.published
    }

    /// Open a change stream on `collection` and follow it until it fails.
    pub async fn run(mut self, collection: Collection<Document>) -> ListenerState {
        crate::log_event!("stream", "connecting", "{}", collection.name());

        let opened = collection
            .watch()
            .pipeline([doc! {
                "$match": { "operationType": { "$in": ["insert", "replace", "update"] } }
            }])
            .await;

        match opened {
            Ok(stream) => {
                let records = stream.map(|item| {
                    item.map(ChangeRecord::from)
                        .map_err(StorageError::database("change stream"))
                });
                self.consume(records).await
            }
            Err(e) => {
                tracing::error!("[stream] failed to open change stream: {e}");
                self.state = ListenerState::Failed;
                self.state
            }
        }
    }

    /// Publish every record of an open subscription.
    ///
    /// An error or the end of the subscription leaves the listener in
    /// [`ListenerState::Failed`].
    pub async fn consume<S>(&mut self, records: S) -> ListenerState
    where
        S: Stream<Item = Result<ChangeRecord, StorageError>>,
    {
        let mut records = std::pin::pin!(records);
        self.state = ListenerState::Watching;
        crate::log_event!("stream", "watching");

        while let Some(item) = records.next().await {
            match item {
                Ok(record) => self.publish(&record),
                Err(e) => {
                    tracing::error!("[stream] change stream error: {e}");
                    self.state = ListenerState::Failed;
                    return self.state;
                }
            }
        }

        tracing::warn!("[stream] change stream ended");
        self.state = ListenerState::Failed;
        self.state
    }

    fn publish(&mut self, record: &ChangeRecord) {
        let fields = record.changed_fields();
        if fields.is_empty() {
            crate::debug_event!("stream", "ignored", "{:?} without string fields", record.kind);
            return;
        }

        crate::debug_event!("stream", "changed", "{:?} with {} fields", record.kind, fields.len());
        let change = ChangeEvent::from_entries(fields, ChangeSource::Database);
        self.bus.publish(PipelineEvent::ContentChanged(change));
        self.published += 1;
    }
}
