//! Storage Layer
//!
//! In-memory implementation of every persistence trait the engine uses,
//! with retention limits and postcard snapshots of the full audit trail.

mod repository;
mod snapshot;

pub use repository::Repository;
pub use snapshot::Snapshot;

use care_model::PersistenceError;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<StorageError> for PersistenceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DatabaseError(msg) => PersistenceError::Database(msg),
            StorageError::SerializationError(msg) => PersistenceError::Serialization(msg),
        }
    }
}
