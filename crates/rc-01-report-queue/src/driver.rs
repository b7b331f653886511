//! Queue backend selection by name.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use shared_store::{open_store, StoreDriver};
use shared_types::ReportRegistry;

use crate::adapters::{InMemoryQueue, PersistentQueue};
use crate::error::QueueError;
use crate::ports::ReportQueue;

/// Queue backend selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDriver {
    /// `InMemoryQueue`; lost on restart.
    Memory,
    /// `PersistentQueue` on a single-file store.
    File,
    /// `PersistentQueue` on RocksDB.
    RocksDb,
    /// `RedisQueue`, shareable between processes; needs the `redis` feature.
    Redis,
}

impl QueueDriver {
    pub const NAMES: &'static [&'static str] = &["memory", "file", "rocksdb", "redis"];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueDriver::Memory => "memory",
            QueueDriver::File => "file",
            QueueDriver::RocksDb => "rocksdb",
            QueueDriver::Redis => "redis",
        }
    }
}

impl fmt::Display for QueueDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueDriver {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(QueueDriver::Memory),
            "file" => Ok(QueueDriver::File),
            "rocksdb" => Ok(QueueDriver::RocksDb),
            "redis" => Ok(QueueDriver::Redis),
            other => Err(QueueError::UnknownDriver {
                name: other.to_string(),
                supported: Self::NAMES.join(", "),
            }),
        }
    }
}

/// Queue name and backend locations. Each driver reads only the fields it
/// needs.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Part of every persistent key.
    pub name: String,
    /// Store path for `file` and `rocksdb`.
    pub path: PathBuf,
    /// Connection URL for `redis`.
    pub redis_url: String,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            name: "reports".to_string(),
            path: PathBuf::from("data/queue.db"),
            redis_url: "redis://localhost:6379/0".to_string(),
        }
    }
}

/// Open the queue named by `options` on the backend named by `driver`.
pub async fn open_queue(
    driver: QueueDriver,
    options: &QueueOptions,
    registry: Arc<ReportRegistry>,
) -> Result<Arc<dyn ReportQueue>, QueueError> {
    let store_driver = match driver {
        QueueDriver::Memory => return Ok(Arc::new(InMemoryQueue::new())),
        QueueDriver::File => StoreDriver::File,
        QueueDriver::RocksDb => StoreDriver::RocksDb,
        #[cfg(feature = "redis")]
        QueueDriver::Redis => {
            let queue =
                crate::adapters::RedisQueue::connect(&options.redis_url, &options.name, registry)
                    .await?;
            return Ok(Arc::new(queue));
        }
        #[cfg(not(feature = "redis"))]
        QueueDriver::Redis => return Err(QueueError::DriverUnavailable(driver.to_string())),
    };

    let store = open_store(store_driver, &options.path)?;
    Ok(Arc::new(PersistentQueue::open(store, &options.name, registry)?))
}
