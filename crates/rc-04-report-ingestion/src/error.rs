//! Error types for report ingestion

use rc_01_report_queue::QueueError;
use rc_02_report_storage::StorageError;
use rc_03_report_cache::CacheError;
use shared_crypto::CryptoError;
use shared_types::ReportError;
use thiserror::Error;

/// Errors propagated from `save_report`.
///
/// Storage duplicates never surface here; they are a successful outcome.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Failed to fingerprint report: {0}")]
    Hash(#[from] CryptoError),

    #[error("Failed to encode report: {0}")]
    Report(#[from] ReportError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Pipeline stage an intake error came from, for metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStage {
    Hash,
    Queue,
    Cache,
    Storage,
}

impl IntakeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStage::Hash => "hash",
            IntakeStage::Queue => "queue",
            IntakeStage::Cache => "cache",
            IntakeStage::Storage => "storage",
        }
    }
}

impl IntakeError {
    pub fn stage(&self) -> IntakeStage {
        match self {
            IntakeError::Hash(_) | IntakeError::Report(_) => IntakeStage::Hash,
            IntakeError::Queue(_) => IntakeStage::Queue,
            IntakeError::Cache(_) => IntakeStage::Cache,
            IntakeError::Storage(_) => IntakeStage::Storage,
        }
    }
}
