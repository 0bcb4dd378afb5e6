//! Storage Layer
//!
//! Provides driving session persistence with repository pattern.

mod repository;

pub use repository::{Repository, SessionRecord};

use dms::StoreError;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
