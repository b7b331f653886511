//! Cache backend selection by name.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapters::{FileCache, InMemoryCache};
use crate::error::CacheError;
use crate::ports::ReportCache;

/// Cache backend selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDriver {
    Memory,
    File,
    /// Shared Redis database; needs the `redis` feature.
    Redis,
    /// Shared memcached servers; needs the `memcached` feature.
    Memcached,
}

impl CacheDriver {
    pub const NAMES: &'static [&'static str] = &["memory", "file", "redis", "memcached"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDriver::Memory => "memory",
            CacheDriver::File => "file",
            CacheDriver::Redis => "redis",
            CacheDriver::Memcached => "memcached",
        }
    }
}

impl fmt::Display for CacheDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheDriver {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheDriver::Memory),
            "file" => Ok(CacheDriver::File),
            "redis" => Ok(CacheDriver::Redis),
            "memcached" => Ok(CacheDriver::Memcached),
            other => Err(CacheError::UnknownDriver {
                name: other.to_string(),
                supported: Self::NAMES.join(", "),
            }),
        }
    }
}

/// Backend locations. Each driver reads only its own field.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Directory for `file`.
    pub dir: PathBuf,
    /// Connection URL for `redis`.
    pub redis_url: String,
    /// `host:port` list for `memcached`.
    pub memcached_servers: Vec<String>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            redis_url: "redis://localhost:6379/0".to_string(),
            memcached_servers: vec!["localhost:11211".to_string()],
        }
    }
}

/// Open the cache named by `driver`.
pub async fn open_cache(
    driver: CacheDriver,
    options: &CacheOptions,
) -> Result<Arc<dyn ReportCache>, CacheError> {
    match driver {
        CacheDriver::Memory => Ok(Arc::new(InMemoryCache::new())),
        CacheDriver::File => Ok(Arc::new(FileCache::open(&options.dir).await?)),
        #[cfg(feature = "redis")]
        CacheDriver::Redis => Ok(Arc::new(
            crate::adapters::RedisCache::connect(&options.redis_url).await?,
        )),
        #[cfg(feature = "memcached")]
        CacheDriver::Memcached => Ok(Arc::new(crate::adapters::MemcachedCache::connect(
            &options.memcached_servers,
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(CacheError::DriverUnavailable(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("Redis".parse::<CacheDriver>().unwrap(), CacheDriver::Redis);
        assert_eq!(
            " memcached ".parse::<CacheDriver>().unwrap(),
            CacheDriver::Memcached
        );
    }

    #[test]
    fn test_unknown_driver() {
        let err = "mongo".parse::<CacheDriver>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown cache driver \"mongo\" (supported: memory, file, redis, memcached)"
        );
    }

    #[tokio::test]
    async fn test_open_memory() {
        let cache = open_cache(CacheDriver::Memory, &CacheOptions::default())
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn test_redis_without_feature_is_unavailable() {
        let result = open_cache(CacheDriver::Redis, &CacheOptions::default()).await;
        assert!(matches!(result, Err(CacheError::DriverUnavailable(name)) if name == "redis"));
    }
}
