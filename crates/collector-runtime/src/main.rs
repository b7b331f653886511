//! # Report Collector
//!
//! Entry point: telemetry first, then configuration, then the runtime.

use anyhow::{Context, Result};
use collector_runtime::{CollectorConfig, CollectorRuntime};
use report_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .await
        .context("initializing telemetry")?;

    let config = CollectorConfig::from_env().context("loading configuration")?;
    info!(
        name = %config.app.name,
        env = %config.app.env,
        version = env!("CARGO_PKG_VERSION"),
        "Starting report collector"
    );

    let mut runtime = CollectorRuntime::build(config).await?;
    let served = runtime.run().await;
    runtime.shutdown().await?;
    served
}
