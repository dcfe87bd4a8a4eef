//! Error types for the storage layer.

use kvmap_model::ModelError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An entity property could not be read or written.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error reported by the store client. Passed through as-is.
    #[error("store client error: {0}")]
    Client(String),

    /// The entity belongs to a different schema than the repository.
    #[error("repository for '{expected}' cannot save an entity of type '{found}'")]
    SchemaMismatch { expected: String, found: String },

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
