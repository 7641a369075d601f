use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Invalid field name '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn database(operation: &'static str) -> impl FnOnce(mongodb::error::Error) -> Self {
        move |source| StorageError::Database { operation, source }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure to write a change into the aggregate document.
pub type PersistError = StorageError;
