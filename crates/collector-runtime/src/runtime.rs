//! Collector lifecycle: build, serve, shut down.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use rc_04_report_ingestion::{
    spawn_periodic, BatchFlusher, MetricsRecorder, ReportIntake, ReportService, SchedulerHandle,
};
use rc_03_report_cache::{CacheError, ReportCache};
use rc_05_api_gateway::ApiGatewayService;
use tracing::{debug, error, info, warn};

use crate::adapters::PrometheusMetrics;
use crate::container::{CollectorConfig, Components};

/// The running collector.
///
/// ## Startup Sequence
///
/// 1. Validate configuration
/// 2. Open registry, storage (migrated), cache and queue
/// 3. Wire the intake service
/// 4. Start the flush scheduler when buffering through the queue, or the
///    cache purge scheduler when intake uses the cache
/// 5. Build the gateway
pub struct CollectorRuntime {
    config: CollectorConfig,
    components: Components,
    service: Arc<ReportService>,
    flusher: Option<Arc<BatchFlusher>>,
    scheduler: Option<SchedulerHandle>,
    purger: Option<SchedulerHandle>,
    gateway: Option<ApiGatewayService>,
}

impl CollectorRuntime {
    /// Validate `config`, open its backends and wire everything.
    pub async fn build(config: CollectorConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let components = Components::open(&config).await?;
        Self::from_components(config, components)
    }

    /// Wire already opened backends. Must run inside a Tokio runtime.
    pub fn from_components(config: CollectorConfig, components: Components) -> Result<Self> {
        report_telemetry::register_metrics().context("registering metrics")?;
        let metrics: Arc<dyn MetricsRecorder> = Arc::new(PrometheusMetrics);

        let mut service = ReportService::new(
            Arc::clone(&components.store),
            Arc::clone(&components.cache),
            config.cache.enabled,
        )
        .with_cache_ttl(config.cache.ttl)
        .with_metrics(Arc::clone(&metrics));

        let (flusher, scheduler) = match &components.queue {
            Some(queue) => {
                service = service.with_queue(Arc::clone(queue));
                let flusher = Arc::new(
                    BatchFlusher::new(
                        Arc::clone(queue),
                        Arc::clone(&components.store),
                        config.flush.batch_size,
                    )
                    .with_metrics(Arc::clone(&metrics)),
                );
                let scheduler = start_flush_scheduler(Arc::clone(&flusher), &config);
                (Some(flusher), Some(scheduler))
            }
            None => (None, None),
        };

        let purger = config
            .uses_cache()
            .then(|| start_purge_scheduler(Arc::clone(&components.cache), &config));

        let service = Arc::new(service);
        info!(
            buffering = config.cache.enabled,
            queue = flusher.is_some(),
            cache = config.uses_cache(),
            "Intake service ready"
        );

        let intake: Arc<dyn ReportIntake> = service.clone();
        let gateway = ApiGatewayService::new(
            config.gateway.clone(),
            Arc::clone(&components.registry),
            intake,
        )
        .context("building gateway")?;

        Ok(Self {
            config,
            components,
            service,
            flusher,
            scheduler,
            purger,
            gateway: Some(gateway),
        })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn service(&self) -> Arc<ReportService> {
        Arc::clone(&self.service)
    }

    /// Flusher, present when buffering through the queue.
    pub fn flusher(&self) -> Option<Arc<BatchFlusher>> {
        self.flusher.clone()
    }

    /// Gateway, until `run` takes it.
    pub fn gateway(&self) -> Option<&ApiGatewayService> {
        self.gateway.as_ref()
    }

    /// Serve until Ctrl+C.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let gateway = self
            .gateway
            .take()
            .context("gateway already started")?;
        info!(addr = %gateway.bind_addr(), "Collector is running. Press Ctrl+C to stop.");
        gateway.serve(shutdown).await?;
        Ok(())
    }

    /// Stop the scheduler, drain the queue when configured, and close the
    /// queue and cache.
    ///
    /// Every step runs even when an earlier one fails.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down collector");

        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop().await;
        }
        if let Some(purger) = self.purger.take() {
            purger.stop().await;
        }

        if let (Some(flusher), true) = (&self.flusher, self.config.flush.drain_on_shutdown) {
            match flusher.drain().await {
                Ok(summary) => info!(
                    persisted = summary.persisted,
                    duplicates = summary.duplicates,
                    failed = summary.failed,
                    "Drained queue"
                ),
                Err(e) => warn!(error = %e, "Failed to drain queue"),
            }
        }

        if let Some(queue) = &self.components.queue {
            if let Err(e) = queue.close().await {
                warn!(error = %e, "Failed to close queue");
            }
        }
        if let Err(e) = self.components.cache.close().await {
            warn!(error = %e, "Failed to close cache");
        }

        info!("Collector stopped");
        Ok(())
    }
}

fn start_flush_scheduler(flusher: Arc<BatchFlusher>, config: &CollectorConfig) -> SchedulerHandle {
    info!(
        interval_secs = config.flush.interval.as_secs(),
        batch_size = flusher.batch_size(),
        "Batch flush scheduler started"
    );
    spawn_periodic("batch-flush", config.flush.interval, move || {
        let flusher = Arc::clone(&flusher);
        async move { flusher.flush().await.map(|_| ()) }
    })
}

fn start_purge_scheduler(cache: Arc<dyn ReportCache>, config: &CollectorConfig) -> SchedulerHandle {
    info!(
        interval_secs = config.cache.purge_interval.as_secs(),
        "Cache purge scheduler started"
    );
    spawn_periodic("cache-purge", config.cache.purge_interval, move || {
        let cache = Arc::clone(&cache);
        async move {
            let removed = cache.purge_expired().await?;
            if removed > 0 {
                debug!(removed, "Purged expired cache entries");
            }
            Ok::<(), CacheError>(())
        }
    })
}
