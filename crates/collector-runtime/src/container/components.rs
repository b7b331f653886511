//! Backend construction in dependency order.

use std::sync::Arc;

use anyhow::{Context, Result};
use rc_01_report_queue::{open_queue, ReportQueue};
use rc_02_report_storage::{open_report_store, ReportStore};
use rc_03_report_cache::{open_cache, NoOpCache, ReportCache};
use shared_types::ReportRegistry;
use tracing::info;

use crate::container::config::CollectorConfig;

/// Opened backends shared by the intake service, flusher and gateway.
pub struct Components {
    pub registry: Arc<ReportRegistry>,
    pub store: Arc<dyn ReportStore>,
    /// `NoOpCache` unless intake consults the cache.
    pub cache: Arc<dyn ReportCache>,
    /// Present only when buffering through the queue.
    pub queue: Option<Arc<dyn ReportQueue>>,
}

impl Components {
    /// Open every backend named by `config`.
    ///
    /// Order: registry, storage (migrated), cache, then queue.
    pub async fn open(config: &CollectorConfig) -> Result<Self> {
        let registry = ReportRegistry::with_defaults();
        registry.validate().context("report registry")?;
        let registry = Arc::new(registry);
        info!(types = ?registry.types().collect::<Vec<_>>(), "Report registry ready");

        let store_driver = config.storage.driver()?;
        let store = open_report_store(store_driver, &config.storage.path)
            .with_context(|| format!("opening {store_driver} report store"))?;
        store.migrate().await.context("migrating report store")?;
        info!(driver = %store_driver, path = %config.storage.path.display(), "Report store ready");

        let cache: Arc<dyn ReportCache> = if config.uses_cache() {
            let cache_driver = config.cache.driver()?;
            let cache = open_cache(cache_driver, &config.cache_options())
                .await
                .with_context(|| format!("opening {cache_driver} cache"))?;
            info!(driver = %cache_driver, "Cache ready");
            cache
        } else {
            Arc::new(NoOpCache)
        };

        let queue = if config.buffering_with_queue() {
            let queue_driver = config.queue.driver()?;
            let queue = open_queue(queue_driver, &config.queue_options(), Arc::clone(&registry))
                .await
                .with_context(|| format!("opening {queue_driver} queue"))?;
            info!(driver = %queue_driver, name = %config.queue.name, "Queue ready");
            Some(queue)
        } else {
            None
        };

        Ok(Self {
            registry,
            store: Arc::new(store),
            cache,
            queue,
        })
    }
}
