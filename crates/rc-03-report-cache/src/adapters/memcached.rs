//! Memcached-backed cache.
//!
//! The client is blocking, so every call runs on the blocking pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::ports::ReportCache;

/// Cache shared by every collector pointed at the same servers.
pub struct MemcachedCache {
    client: Arc<memcache::Client>,
    closed: AtomicBool,
}

impl MemcachedCache {
    /// Connect to `servers`, each `host:port` or a `memcache://` URL.
    pub fn connect(servers: &[String]) -> Result<Self, CacheError> {
        let urls = server_urls(servers);
        if urls.is_empty() {
            return Err(CacheError::Backend("no memcached servers configured".into()));
        }
        let client = memcache::Client::connect(urls.clone())?;
        tracing::info!(servers = ?urls, "Connected to memcached cache");
        Ok(Self {
            client: Arc::new(client),
            closed: AtomicBool::new(false),
        })
    }

    async fn call<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&memcache::Client) -> Result<T, memcache::MemcacheError> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        let client = Arc::clone(&self.client);
        let result = tokio::task::spawn_blocking(move || f(client.as_ref()))
            .await
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))?;
        Ok(result?)
    }
}

fn server_urls(servers: &[String]) -> Vec<String> {
    servers
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with("memcache://") {
                s.to_string()
            } else {
                format!("memcache://{s}")
            }
        })
        .collect()
}

/// Expiry in whole seconds, at least 1. Memcached reads values above 30
/// days as absolute timestamps, so longer lifetimes are clamped.
fn expiration_secs(ttl: Duration) -> u32 {
    const MAX_RELATIVE: u64 = 30 * 24 * 60 * 60;
    ttl.as_secs().clamp(1, MAX_RELATIVE) as u32
}

#[async_trait]
impl ReportCache for MemcachedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = key.to_string();
        self.call(move |client| client.get::<Vec<u8>>(&key)).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let key = key.to_string();
        let value = value.to_vec();
        let expiration = expiration_secs(ttl);
        self.call(move |client| client.set(&key, value.as_slice(), expiration))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();
        self.call(move |client| client.delete(&key).map(|_| ())).await
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(0)
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
