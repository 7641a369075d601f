//! In-process content store.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::content::ContentSnapshot;

use super::ContentStore;
use super::error::{StorageError, StorageResult};

/// A [`ContentStore`] kept in memory.
///
/// Records every write in order and can be switched into a failing mode,
/// which makes it the store of choice for pipeline tests.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    fields: Mutex<ContentSnapshot>,
    writes: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: ContentSnapshot) -> Self {
        Self {
            fields: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Make every following call fail with [`StorageError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> ContentSnapshot {
        self.fields
            .lock()
            .map(|fields| fields.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("memory store set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn load_all(&self) -> StorageResult<ContentSnapshot> {
        self.check_available()?;
        Ok(self.snapshot())
    }

    async fn set_field(&self, key: &str, content: &str) -> StorageResult<()> {
        self.check_available()?;

        let mut fields = self
            .fields
            .lock()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        fields.insert(key, content);
        drop(fields);

        if let Ok(mut writes) = self.writes.lock() {
            writes.push((key.to_string(), content.to_string()));
        }
        Ok(())
    }
}
