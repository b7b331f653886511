//! Error types for the report cache

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache is closed")]
    Closed,

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[cfg(feature = "memcached")]
    #[error("Memcached error: {0}")]
    Memcached(#[from] memcache::MemcacheError),

    #[error("Unknown cache driver {name:?} (supported: {supported})")]
    UnknownDriver { name: String, supported: String },

    #[error("Cache driver '{0}' is not compiled into this build")]
    DriverUnavailable(String),
}
