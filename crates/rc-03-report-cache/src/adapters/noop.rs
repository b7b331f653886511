//! Cache used when caching is switched off.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::ports::ReportCache;

/// Stores nothing. Every read misses and every write succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpCache;

#[async_trait]
impl ReportCache for NoOpCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }

    async fn close(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_is_never_visible() {
        let cache = NoOpCache;
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.close().await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
