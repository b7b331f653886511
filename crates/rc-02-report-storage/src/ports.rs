//! Storage port.

use async_trait::async_trait;
use shared_types::Report;

use crate::error::StorageError;

/// Durable report storage, unique on `hash`.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Prepare the schema. Idempotent; called once at startup before any
    /// `save`.
    async fn migrate(&self) -> Result<(), StorageError>;

    /// Persist a report under a fresh row id.
    ///
    /// Fails with [`StorageError::Duplicate`] if `hash` is already stored.
    async fn save(
        &self,
        report_type: &str,
        report: &Report,
        user_agent: &str,
        hash: &str,
    ) -> Result<(), StorageError>;
}
