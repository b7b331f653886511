//! Report intake service.
//!
//! Implements [`ReportIntake`] on top of the queue, cache and storage ports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rc_01_report_queue::ReportQueue;
use rc_02_report_storage::{ReportStore, StorageError};
use rc_03_report_cache::ReportCache;
use shared_crypto::canonical_hash;
use shared_types::{Report, ReportEnvelope};
use tracing::{debug, instrument, warn};

use crate::domain::{IntakeOutcome, DEFAULT_CACHE_TTL};
use crate::error::IntakeError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::ReportIntake;

/// Intake decision logic.
///
/// With buffering enabled and a queue attached, reports are buffered for the
/// flusher. With buffering enabled and no queue, the cache filters recent
/// duplicates in front of storage. With buffering disabled, every report
/// goes straight to storage.
pub struct ReportService {
    store: Arc<dyn ReportStore>,
    cache: Arc<dyn ReportCache>,
    queue: Option<Arc<dyn ReportQueue>>,
    buffering_enabled: bool,
    cache_ttl: Duration,
    metrics: Arc<dyn MetricsRecorder>,
}

impl ReportService {
    pub fn new(
        store: Arc<dyn ReportStore>,
        cache: Arc<dyn ReportCache>,
        buffering_enabled: bool,
    ) -> Self {
        Self {
            store,
            cache,
            queue: None,
            buffering_enabled,
            cache_ttl: DEFAULT_CACHE_TTL,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Attach the buffer queue. Only consulted while buffering is enabled.
    pub fn with_queue(mut self, queue: Arc<dyn ReportQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    async fn intake(
        &self,
        report_type: &str,
        report: Report,
        user_agent: &str,
    ) -> Result<IntakeOutcome, IntakeError> {
        let hash = canonical_hash(&report.hash_data()?)?;

        if !self.buffering_enabled {
            return self.persist(report_type, &report, user_agent, &hash).await;
        }

        match &self.queue {
            Some(queue) => self.buffer(queue.as_ref(), report_type, report, user_agent, hash).await,
            None => self.persist_cached(report_type, &report, user_agent, &hash).await,
        }
    }

    async fn buffer(
        &self,
        queue: &dyn ReportQueue,
        report_type: &str,
        report: Report,
        user_agent: &str,
        hash: String,
    ) -> Result<IntakeOutcome, IntakeError> {
        if queue.contains(&hash).await? {
            debug!(%hash, "Report already buffered");
            return Ok(IntakeOutcome::DuplicateBuffered);
        }

        queue
            .enqueue(ReportEnvelope::new(report_type, report, user_agent, hash))
            .await?;

        match queue.size().await {
            Ok(depth) => self.metrics.record_queue_depth(depth),
            Err(e) => debug!(error = %e, "Queue depth unavailable"),
        }
        Ok(IntakeOutcome::Enqueued)
    }

    async fn persist_cached(
        &self,
        report_type: &str,
        report: &Report,
        user_agent: &str,
        hash: &str,
    ) -> Result<IntakeOutcome, IntakeError> {
        if self.cache.get(hash).await?.is_some() {
            debug!(%hash, "Report seen recently");
            return Ok(IntakeOutcome::DuplicateCached);
        }

        let outcome = self.persist(report_type, report, user_agent, hash).await?;

        // Marker value is the report itself; only presence is checked.
        let marker = report.to_json()?;
        self.cache.set(hash, &marker, self.cache_ttl).await?;
        Ok(outcome)
    }

    async fn persist(
        &self,
        report_type: &str,
        report: &Report,
        user_agent: &str,
        hash: &str,
    ) -> Result<IntakeOutcome, IntakeError> {
        match self.store.save(report_type, report, user_agent, hash).await {
            Ok(()) => Ok(IntakeOutcome::Stored),
            Err(StorageError::Duplicate { .. }) => {
                debug!(%hash, "Report already stored");
                Ok(IntakeOutcome::DuplicateStored)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ReportIntake for ReportService {
    #[instrument(skip(self, report, user_agent), fields(report_type = %report_type))]
    async fn save_report(
        &self,
        report_type: &str,
        report: Report,
        user_agent: &str,
    ) -> Result<IntakeOutcome, IntakeError> {
        match self.intake(report_type, report, user_agent).await {
            Ok(outcome) => {
                self.metrics.record_intake(report_type, outcome);
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, stage = e.stage().as_str(), "Report intake failed");
                self.metrics.record_intake_error(e.stage());
                Err(e)
            }
        }
    }
}
