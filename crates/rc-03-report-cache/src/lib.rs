//! # RC-03 Report Cache
//!
//! Short-lived marker cache consulted by intake in direct-cache mode. A hit
//! means "this hash was accepted recently"; a miss is never authoritative,
//! storage uniqueness decides.
//!
//! ## Backends
//!
//! - `InMemoryCache`: map of value + deadline, expired entries evicted lazily
//! - `FileCache`: one file per key under a directory, shared across restarts
//! - `RedisCache` (feature `redis`): keys with a server-side expiry
//! - `MemcachedCache` (feature `memcached`): keys with a server-side expiry
//! - `NoOpCache`: stands in when caching is off
//!
//! Absent and expired keys read as `None`, never as errors. Local backends
//! hold expired entries until a read or `purge_expired` removes them.

pub mod adapters;
pub mod driver;
pub mod error;
pub mod ports;

pub use adapters::{FileCache, InMemoryCache, NoOpCache};
#[cfg(feature = "memcached")]
pub use adapters::MemcachedCache;
#[cfg(feature = "redis")]
pub use adapters::RedisCache;
pub use driver::{open_cache, CacheDriver, CacheOptions};
pub use error::CacheError;
pub use ports::ReportCache;
