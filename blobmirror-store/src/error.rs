//! Object-store error types.

use thiserror::Error;

/// Result type for object-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by an [`ObjectStore`](crate::ObjectStore) after its own
/// retry policy has been exhausted.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("object store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid connection descriptor: {0}")]
    InvalidConnection(String),

    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns true if the remote reported the container or object missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
