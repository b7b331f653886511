//! Batch flusher: moves buffered envelopes into storage.

use std::sync::Arc;
use std::time::Instant;

use rc_01_report_queue::{QueueError, ReportQueue};
use rc_02_report_storage::{ReportStore, StorageError};
use tracing::{debug, info, warn};

use crate::domain::FlushSummary;
use crate::metrics::{MetricsRecorder, NoOpMetrics};

/// Drains the queue into storage in batches.
///
/// Delivery is at-most-once: envelopes are removed before they are saved,
/// and a failed save is logged and dropped.
pub struct BatchFlusher {
    queue: Arc<dyn ReportQueue>,
    store: Arc<dyn ReportStore>,
    batch_size: usize,
    metrics: Arc<dyn MetricsRecorder>,
}

impl BatchFlusher {
    /// `batch_size` below 1 is raised to 1.
    pub fn new(queue: Arc<dyn ReportQueue>, store: Arc<dyn ReportStore>, batch_size: usize) -> Self {
        Self {
            queue,
            store,
            batch_size: batch_size.max(1),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run one flush cycle: dequeue up to `batch_size` envelopes and save
    /// each in order.
    ///
    /// Only a dequeue failure is an error. Save failures are counted in the
    /// summary.
    pub async fn flush(&self) -> Result<FlushSummary, QueueError> {
        let started = Instant::now();
        let batch = self.queue.dequeue_n(self.batch_size).await?;
        let mut summary = FlushSummary {
            dequeued: batch.len(),
            ..Default::default()
        };

        for envelope in &batch {
            match self
                .store
                .save(
                    &envelope.report_type,
                    &envelope.report,
                    &envelope.user_agent,
                    &envelope.hash,
                )
                .await
            {
                Ok(()) => summary.persisted += 1,
                Err(StorageError::Duplicate { .. }) => {
                    debug!(hash = %envelope.hash, "Flushed report already stored");
                    summary.duplicates += 1;
                }
                Err(e) => {
                    warn!(
                        hash = %envelope.hash,
                        report_type = %envelope.report_type,
                        error = %e,
                        "Dropping report that failed to persist"
                    );
                    summary.failed += 1;
                }
            }
        }

        if !summary.is_empty() {
            info!(
                dequeued = summary.dequeued,
                persisted = summary.persisted,
                duplicates = summary.duplicates,
                failed = summary.failed,
                "Flushed report batch"
            );
        }
        self.metrics.record_flush(&summary, started.elapsed());
        if let Ok(depth) = self.queue.size().await {
            self.metrics.record_queue_depth(depth);
        }
        Ok(summary)
    }

    /// Flush repeatedly until the queue is empty. Used on shutdown.
    ///
    /// Bounded by the depth seen at the start, so reports arriving during
    /// the drain cannot keep it running forever.
    pub async fn drain(&self) -> Result<FlushSummary, QueueError> {
        let initial = self.queue.size().await?;
        let max_cycles = initial / self.batch_size + 1;
        let mut total = FlushSummary::default();

        for _ in 0..max_cycles {
            let summary = self.flush().await?;
            total.merge(summary);
            if summary.is_empty() || self.queue.size().await? == 0 {
                break;
            }
        }
        Ok(total)
    }
}
