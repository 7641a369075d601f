//! Member signups.

use std::sync::LazyLock;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MongoDB duplicate key error code.
const DUPLICATE_KEY: i32 = 11000;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+$").expect("email pattern is valid")
});

#[derive(Error, Debug)]
pub enum MemberError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("A member with email {0} already exists")]
    DuplicateEmail(String),

    #[error("No member with email {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// A stored member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub info: String,
    pub email: String,
}

impl MemberRecord {
    /// Validated record. The email is trimmed and lowercased.
    pub fn new(info: impl Into<String>, email: &str) -> Result<Self, MemberError> {
        let email = validate_email(email)?;
        Ok(Self {
            info: info.into(),
            email,
        })
    }
}

/// Normalize `email` and check it looks like an address.
pub fn validate_email(email: &str) -> Result<String, MemberError> {
    let normalized = email.trim().to_lowercase();
    if EMAIL_PATTERN.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(MemberError::InvalidEmail(email.to_string()))
    }
}

/// Where new members are added.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Add `record`; fails with [`MemberError::DuplicateEmail`] if the email
    /// is taken.
    async fn add(&self, record: MemberRecord) -> Result<(), MemberError>;
}

/// Updates stored member information.
#[async_trait]
pub trait MemberWriter: Send + Sync {
    /// Replace the info of the member with `record.email`.
    async fn write(&self, record: &MemberRecord) -> Result<(), MemberError>;
}

/// Members in a MongoDB collection with a unique email index.
#[derive(Clone, Debug)]
pub struct MemberRepository {
    collection: Collection<MemberRecord>,
}

impl MemberRepository {
    /// Wrap `collection`, creating the unique email index if missing.
    pub async fn open(collection: Collection<MemberRecord>) -> Result<Self, MemberError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|e| MemberError::Database(e.to_string()))?;

        Ok(Self { collection })
    }
}

#[async_trait]
impl MemberStore for MemberRepository {
    async fn add(&self, record: MemberRecord) -> Result<(), MemberError> {
        match self.collection.insert_one(&record).await {
            Ok(_) => {
                crate::log_event!("members", "added", "{}", record.email);
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => Err(MemberError::DuplicateEmail(record.email)),
            Err(e) => Err(MemberError::Database(e.to_string())),
        }
    }
}

#[async_trait]
impl MemberWriter for MemberRepository {
    async fn write(&self, record: &MemberRecord) -> Result<(), MemberError> {
        let result = self
            .collection
            .update_one(
                doc! { "email": record.email.as_str() },
                doc! { "$set": { "info": record.info.as_str() } },
            )
            .await
            .map_err(|e| MemberError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            return Err(MemberError::NotFound(record.email.clone()));
        }
        crate::debug_event!("members", "updated", "{}", record.email);
        Ok(())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}
