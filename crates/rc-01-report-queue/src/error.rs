//! Error types for the report queue

use shared_store::KVStoreError;
use shared_types::ReportError;
use thiserror::Error;

/// Errors that can occur in the report queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue is closed")]
    Closed,

    #[error("Queue backend error: {0}")]
    Backend(#[from] KVStoreError),

    #[error("Envelope encoding error: {0}")]
    Encoding(#[from] ReportError),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Queue state corrupted: {0}")]
    Corrupted(String),

    #[error("Unknown queue driver {name:?} (supported: {supported})")]
    UnknownDriver { name: String, supported: String },

    #[error("Queue driver '{0}' is not compiled into this build")]
    DriverUnavailable(String),
}
