use mongodb::bson::Document;
use mongodb::change_stream::event::{ChangeStreamEvent, OperationType};

use crate::storage::mongo::string_fields;

/// Operation behind a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Replace,
    Update,
    Other(String),
}

/// The parts of a change stream notification the pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub full_document: Option<Document>,
    pub updated_fields: Option<Document>,
}

impl ChangeRecord {
    pub fn insert(document: Document) -> Self {
        Self {
            kind: ChangeKind::Insert,
            full_document: Some(document),
            updated_fields: None,
        }
    }

    pub fn update(updated_fields: Document) -> Self {
        Self {
            kind: ChangeKind::Update,
            full_document: None,
            updated_fields: Some(updated_fields),
        }
    }

    /// String fields carried by this notification.
    ///
    /// Inserts and replaces carry the whole document, updates only the fields
    /// they set. `_id` and non-string values are dropped.
    pub fn changed_fields(&self) -> Vec<(String, String)> {
        let source = match self.kind {
            ChangeKind::Insert | ChangeKind::Replace => self.full_document.as_ref(),
            ChangeKind::Update => self.updated_fields.as_ref(),
            ChangeKind::Other(_) => None,
        };
        source.map(string_fields).unwrap_or_default()
    }
}

impl From<ChangeStreamEvent<Document>> for ChangeRecord {
    fn from(event: ChangeStreamEvent<Document>) -> Self {
        let kind = match event.operation_type {
            OperationType::Insert => ChangeKind::Insert,
            OperationType::Replace => ChangeKind::Replace,
            OperationType::Update => ChangeKind::Update,
            other => ChangeKind::Other(format!("{other:?}")),
        };

        Self {
            kind,
            full_document: event.full_document,
            updated_fields: event.update_description.map(|update| update.updated_fields),
        }
    }
}
