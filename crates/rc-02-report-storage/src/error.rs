//! Error types for report storage

use shared_store::KVStoreError;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A report with this hash is already stored.
    #[error("Duplicate report: {hash}")]
    Duplicate { hash: String },

    /// `save` was called before `migrate`.
    #[error("Report store has not been migrated")]
    NotMigrated,

    /// The store was written by a newer schema.
    #[error("Schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    /// Stored data could not be decoded.
    #[error("Stored data corrupted: {0}")]
    Corrupted(String),

    /// Report could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying key-value store failed.
    #[error("Database error: {0}")]
    Database(#[from] KVStoreError),
}

impl StorageError {
    /// Whether this error signals an already-stored report.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::Duplicate { .. })
    }
}
