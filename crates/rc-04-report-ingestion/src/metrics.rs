//! Metrics hooks for intake and flush.
//!
//! The service and flusher report through [`MetricsRecorder`]; the runtime
//! plugs in a Prometheus-backed recorder, tests use [`IntakeMetrics`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::{FlushSummary, IntakeOutcome};
use crate::error::IntakeStage;

/// Trait for recording pipeline metrics.
pub trait MetricsRecorder: Send + Sync {
    /// One report handled successfully.
    fn record_intake(&self, report_type: &str, outcome: IntakeOutcome);

    /// One intake call failed at `stage`.
    fn record_intake_error(&self, stage: IntakeStage);

    /// One flush cycle finished.
    fn record_flush(&self, summary: &FlushSummary, elapsed: Duration);

    /// Current number of buffered envelopes.
    fn record_queue_depth(&self, depth: usize);
}

/// No-op metrics recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_intake(&self, _report_type: &str, _outcome: IntakeOutcome) {}
    fn record_intake_error(&self, _stage: IntakeStage) {}
    fn record_flush(&self, _summary: &FlushSummary, _elapsed: Duration) {}
    fn record_queue_depth(&self, _depth: usize) {}
}

/// In-process counters.
#[derive(Debug, Default)]
pub struct IntakeMetrics {
    stored: AtomicU64,
    enqueued: AtomicU64,
    duplicates: AtomicU64,
    errors: AtomicU64,
    flush_cycles: AtomicU64,
    flushed_persisted: AtomicU64,
    flushed_failed: AtomicU64,
    queue_depth: AtomicU64,
}

/// Point-in-time copy of [`IntakeMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub stored: u64,
    pub enqueued: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub flush_cycles: u64,
    pub flushed_persisted: u64,
    pub flushed_failed: u64,
    pub queue_depth: u64,
}

impl IntakeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stored: self.stored.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            flush_cycles: self.flush_cycles.load(Ordering::Relaxed),
            flushed_persisted: self.flushed_persisted.load(Ordering::Relaxed),
            flushed_failed: self.flushed_failed.load(Ordering::Relaxed),
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
        }
    }
}

impl MetricsRecorder for IntakeMetrics {
    fn record_intake(&self, _report_type: &str, outcome: IntakeOutcome) {
        let counter = match outcome {
            IntakeOutcome::Stored => &self.stored,
            IntakeOutcome::Enqueued => &self.enqueued,
            _ => &self.duplicates,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_intake_error(&self, _stage: IntakeStage) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_flush(&self, summary: &FlushSummary, _elapsed: Duration) {
        self.flush_cycles.fetch_add(1, Ordering::Relaxed);
        self.flushed_persisted
            .fetch_add(summary.persisted as u64, Ordering::Relaxed);
        self.flushed_failed
            .fetch_add(summary.failed as u64, Ordering::Relaxed);
    }

    fn record_queue_depth(&self, depth: usize) {
        self.queue_depth.store(depth as u64, Ordering::Relaxed);
    }
}
