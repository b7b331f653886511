//! Cache port.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// Key-value cache with per-entry TTL.
#[async_trait]
pub trait ReportCache: Send + Sync {
    /// Value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every expired entry and return how many were removed.
    ///
    /// Backends whose server expires entries itself return 0.
    async fn purge_expired(&self) -> Result<usize, CacheError>;

    /// Release resources. Later operations fail with `Closed`.
    async fn close(&self) -> Result<(), CacheError>;
}
