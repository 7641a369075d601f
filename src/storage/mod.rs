//! Persistent content storage.
//!
//! The page content lives in one aggregate document. [`ContentStore`] is the
//! seam between the pipeline and that document: MongoDB in production,
//! [`MemoryContentStore`] in tests.

pub mod error;
pub mod memory;
pub mod mongo;
pub mod sync;

use async_trait::async_trait;

use crate::content::ContentSnapshot;

pub use error::{PersistError, StorageError, StorageResult};
pub use memory::MemoryContentStore;
pub use mongo::{MongoContentStore, MongoStore};
pub use sync::ContentSynchronizer;

/// Storage for the aggregate content document.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All fields of the aggregate document. Empty when it does not exist yet.
    async fn load_all(&self) -> StorageResult<ContentSnapshot>;

    /// Set one field, creating the document when missing. Other fields are
    /// left untouched.
    async fn set_field(&self, key: &str, content: &str) -> StorageResult<()>;
}
