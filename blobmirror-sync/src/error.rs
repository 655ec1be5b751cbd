//! Sync engine error types.

use blobmirror_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that end a synchronization pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ledger: {0}")]
    MalformedLedger(String),

    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("stop requested")]
    Stopped,
}

impl SyncError {
    /// Returns true if the error came from an explicit stop request.
    pub fn is_stopped(&self) -> bool {
        matches!(self, SyncError::Stopped)
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => SyncError::NotFound(what),
            StoreError::Unavailable(reason) => SyncError::RemoteUnavailable(reason),
            StoreError::InvalidConnection(reason) => SyncError::InvalidArgument(reason),
            StoreError::Io(e) => SyncError::Io(e),
        }
    }
}
