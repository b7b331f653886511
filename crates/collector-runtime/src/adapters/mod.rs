//! Adapters connecting the pipeline crates to process-wide infrastructure.

pub mod prometheus_metrics;

pub use prometheus_metrics::PrometheusMetrics;
