//! In-memory TTL cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::CacheError;
use crate::ports::ReportCache;

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    /// `None` when the deadline is past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// Process-local cache. Expired entries are evicted on read and by
/// `purge_expired`.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: Mutex<Option<HashMap<String, Entry>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Some(HashMap::new())),
        }
    }

    /// Number of entries held, expired or not.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().as_ref().map_or(0, HashMap::len)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut guard = self.entries.lock();
        let entries = guard.as_mut().ok_or(CacheError::Closed)?;

        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_live(Instant::now()) => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
        }
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut guard = self.entries.lock();
        let entries = guard.as_mut().ok_or(CacheError::Closed)?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut guard = self.entries.lock();
        let entries = guard.as_mut().ok_or(CacheError::Closed)?;
        entries.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let mut guard = self.entries.lock();
        let entries = guard.as_mut().ok_or(CacheError::Closed)?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(before - entries.len())
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.entries.lock().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();
        cache.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let cache = InMemoryCache::new();
        cache.set("k", b"v", Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_evicts_keys_never_read_again() {
        let cache = InMemoryCache::new();
        for i in 0..1000 {
            cache
                .set(&format!("hash-{i}"), b"1", Duration::from_millis(1))
                .await
                .unwrap();
        }
        cache.set("fresh", b"2", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.len(), 1001);
        assert_eq!(cache.purge_expired().await.unwrap(), 1000);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let cache = InMemoryCache::new();
        cache.set("k", b"v", Duration::MAX).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_cache_errors() {
        let cache = InMemoryCache::new();
        cache.close().await.unwrap();
        assert!(matches!(cache.get("k").await, Err(CacheError::Closed)));
        assert!(matches!(
            cache.set("k", b"v", Duration::from_secs(1)).await,
            Err(CacheError::Closed)
        ));
        assert!(matches!(cache.purge_expired().await, Err(CacheError::Closed)));
    }
}
