//! # Report Telemetry
//!
//! Observability for the report collector.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events, pretty for development, JSON in containers
//! - **Traces**: optional OTLP export (`otlp` feature)
//! - **Metrics**: Prometheus registry exposed on `GET /metrics`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use report_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).await.unwrap();
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `RC_JSON_LOGS` | `true` in containers | JSON formatted logs |
//! | `RC_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |
//! | `OTEL_SERVICE_NAME` | `report-collector` | Service name in traces |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4317` | OTLP endpoint |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, FLUSH_CYCLES, FLUSH_DURATION, FLUSH_ITEMS,
    INTAKE_ERRORS, INTAKE_REPORTS, QUEUE_DEPTH,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging, tracing and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, it flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config).await?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "report-collector");
    }

    #[test]
    fn test_metric_inc_macro() {
        metric_inc!(FLUSH_CYCLES);
        metric_inc!(INTAKE_ERRORS, &["storage"]);
        assert!(FLUSH_CYCLES.get() >= 1.0);
        assert!(INTAKE_ERRORS.with_label_values(&["storage"]).get() >= 1.0);
    }
}
