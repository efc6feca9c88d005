//! Store error types
//!
//! None of these are fatal: every failure leaves persisted state as it was
//! and can be retried, reported to the user, or worked around with a smaller
//! payload.

use thiserror::Error;

use crate::collection::Collection;
use crate::storage::StorageError;

/// Errors returned by store, backup and quota operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend failed or refused a read or write
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A collection could not be serialized
    #[error("Failed to serialize {collection}: {source}")]
    Serialize {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    /// The sync status document could not be serialized
    #[error("Failed to serialize sync status: {0}")]
    SyncStatus(#[source] serde_json::Error),

    /// Imported text is not a snapshot document
    #[error("Backup is not a valid snapshot: {0}")]
    InvalidSnapshot(#[source] serde_json::Error),

    /// Imported snapshot uses a format version this build cannot read
    #[error("Unsupported backup format version '{0}' (expected 1.x)")]
    UnsupportedVersion(String),
}

impl StoreError {
    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::Storage(e) => e.recovery_suggestion(),
            StoreError::InvalidSnapshot(_) => Some("Check that the file is a Bible Aura backup."),
            StoreError::UnsupportedVersion(_) => {
                Some("The backup was made by a newer version of the app; update and try again.")
            }
            StoreError::Serialize { .. } | StoreError::SyncStatus(_) => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
