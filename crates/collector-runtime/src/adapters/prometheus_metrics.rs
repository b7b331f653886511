//! `MetricsRecorder` backed by the global Prometheus registry.

use std::time::Duration;

use rc_04_report_ingestion::{FlushSummary, IntakeOutcome, IntakeStage, MetricsRecorder};
use report_telemetry::{
    metric_inc, FLUSH_CYCLES, FLUSH_DURATION, FLUSH_ITEMS, INTAKE_ERRORS, INTAKE_REPORTS,
    QUEUE_DEPTH,
};

/// Records intake and flush metrics into `report_telemetry`'s registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl MetricsRecorder for PrometheusMetrics {
    fn record_intake(&self, report_type: &str, outcome: IntakeOutcome) {
        metric_inc!(INTAKE_REPORTS, &[report_type, outcome.as_str()]);
    }

    fn record_intake_error(&self, stage: IntakeStage) {
        metric_inc!(INTAKE_ERRORS, &[stage.as_str()]);
    }

    fn record_flush(&self, summary: &FlushSummary, elapsed: Duration) {
        metric_inc!(FLUSH_CYCLES);
        for (outcome, count) in [
            ("persisted", summary.persisted),
            ("duplicate", summary.duplicates),
            ("failed", summary.failed),
        ] {
            if count > 0 {
                FLUSH_ITEMS.with_label_values(&[outcome]).inc_by(count as f64);
            }
        }
        FLUSH_DURATION.observe(elapsed.as_secs_f64());
    }

    fn record_queue_depth(&self, depth: usize) {
        QUEUE_DEPTH.set(depth as f64);
    }
}
