//! Prometheus metrics for the report collector.
//!
//! All metrics follow the naming convention: `rc_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: intake outcomes, flush cycles, flushed items, errors
//! - **Gauge**: queue depth after the last enqueue/flush
//! - **Histogram**: flush cycle duration

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INTAKE METRICS
    // =========================================================================

    /// Reports handled by the intake service
    pub static ref INTAKE_REPORTS: CounterVec = CounterVec::new(
        Opts::new("rc_intake_reports_total", "Reports handled by intake"),
        &["report_type", "outcome"]  // outcome: stored/enqueued/duplicate_*
    ).expect("metric creation failed");

    /// Intake failures by pipeline stage
    pub static ref INTAKE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("rc_intake_errors_total", "Intake failures by stage"),
        &["stage"]  // stage: hash/queue/cache/storage
    ).expect("metric creation failed");

    // =========================================================================
    // FLUSH METRICS
    // =========================================================================

    /// Completed flush cycles
    pub static ref FLUSH_CYCLES: Counter = Counter::new(
        "rc_flush_cycles_total",
        "Total number of batch flush cycles"
    ).expect("metric creation failed");

    /// Items processed by the flusher
    pub static ref FLUSH_ITEMS: CounterVec = CounterVec::new(
        Opts::new("rc_flush_items_total", "Items drained from the queue"),
        &["outcome"]  // outcome: persisted/duplicate/failed
    ).expect("metric creation failed");

    /// Flush cycle duration
    pub static ref FLUSH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "rc_flush_duration_seconds",
            "Time spent in one batch flush cycle"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("valid bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // QUEUE METRICS
    // =========================================================================

    /// Buffered envelopes
    pub static ref QUEUE_DEPTH: Gauge = Gauge::new(
        "rc_queue_depth",
        "Number of envelopes waiting in the buffering queue"
    ).expect("metric creation failed");
}

/// Handle proving the collector metrics are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; metrics already registered are kept.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(INTAKE_REPORTS.clone()),
        Box::new(INTAKE_ERRORS.clone()),
        Box::new(FLUSH_CYCLES.clone()),
        Box::new(FLUSH_ITEMS.clone()),
        Box::new(FLUSH_DURATION.clone()),
        Box::new(QUEUE_DEPTH.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_encode_contains_registered_metrics() {
        register_metrics().unwrap();
        INTAKE_REPORTS.with_label_values(&["csp", "stored"]).inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("rc_intake_reports_total"));
    }

    #[test]
    fn test_gauge_set() {
        QUEUE_DEPTH.set(42.0);
        assert_eq!(QUEUE_DEPTH.get(), 42.0);
    }
}
