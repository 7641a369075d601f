//! MongoDB client and the aggregate content collection.
//!
//! All dynamic page content lives in a single document. Readers never see its
//! `_id`; writers `$set` one field at a time and create the document on the
//! first write.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Collection};
use tracing::info;

use crate::content::ContentSnapshot;

use super::error::{StorageError, StorageResult};
use super::ContentStore;

/// MongoDB client wrapper
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    db_name: String,
}

impl MongoStore {
    /// Connect and verify the server answers a ping.
    pub async fn connect(uri: &str, db_name: &str) -> StorageResult<Self> {
        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{uri}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        } else {
            format!("{uri}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(StorageError::database("connect"))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(StorageError::database("ping"))?;

        info!("Connected to MongoDB database '{db_name}'");

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// The aggregate content collection.
    pub fn content(&self, collection: &str) -> MongoContentStore {
        MongoContentStore {
            collection: self.client.database(&self.db_name).collection(collection),
        }
    }

    /// A typed collection in this database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.client.database(&self.db_name).collection(name)
    }
}

/// [`ContentStore`] over one MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoContentStore {
    collection: Collection<Document>,
}

impl MongoContentStore {
    /// Underlying collection, for opening change streams.
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }
}

#[async_trait]
impl ContentStore for MongoContentStore {
    async fn load_all(&self) -> StorageResult<ContentSnapshot> {
        let mut cursor = self
            .collection
            .aggregate([doc! { "$project": { "_id": 0 } }])
            .await
            .map_err(StorageError::database("aggregate"))?;

        let document = cursor
            .try_next()
            .await
            .map_err(StorageError::database("aggregate"))?;

        Ok(document
            .map(|doc| string_fields(&doc).into_iter().collect())
            .unwrap_or_default())
    }

    async fn set_field(&self, key: &str, content: &str) -> StorageResult<()> {
        validate_field_name(key)?;

        let mut fields = Document::new();
        fields.insert(key, content);

        self.collection
            .update_one(doc! {}, doc! { "$set": fields })
            .upsert(true)
            .await
            .map_err(StorageError::database("update"))?;

        Ok(())
    }
}

/// String-valued fields of `doc`, without `_id`.
///
/// Anything that is not a string cannot be a template and is skipped.
pub fn string_fields(doc: &Document) -> Vec<(String, String)> {
    doc.iter()
        .filter(|(key, _)| key.as_str() != "_id")
        .filter_map(|(key, value)| match value {
            Bson::String(content) => Some((key.clone(), content.clone())),
            other => {
                crate::debug_event!(
                    "store",
                    "skipped",
                    "{key} holds {:?}, not a string",
                    other.element_type()
                );
                None
            }
        })
        .collect()
}

/// Reject names MongoDB would interpret as paths or operators.
fn validate_field_name(key: &str) -> StorageResult<()> {
    let reason = if key.is_empty() {
        "empty"
    } else if key.contains('.') {
        "contains '.'"
    } else if key.starts_with('$') {
        "starts with '$'"
    } else if key == "_id" {
        "reserved"
    } else {
        return Ok(());
    };

    Err(StorageError::InvalidField {
        field: key.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    // Round trips against a live server are out of reach here; the pure
    // document handling is covered instead.
    use super::*;

    #[test]
    fn test_string_fields_skips_id_and_non_strings() {
        let doc = doc! {
            "_id": mongodb::bson::oid::ObjectId::new(),
            "index": "{{> section_header}}",
            "section_header": "<h1>X</h1>",
            "counter": 3,
        };

        let fields = string_fields(&doc);
        assert_eq!(
            fields,
            vec![
                ("index".to_string(), "{{> section_header}}".to_string()),
                ("section_header".to_string(), "<h1>X</h1>".to_string()),
            ]
        );
    }

    #[test]
    fn test_validate_field_name() {
        assert!(validate_field_name("section_footer").is_ok());
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("a.b").is_err());
        assert!(validate_field_name("$set").is_err());
        assert!(validate_field_name("_id").is_err());
    }
}
