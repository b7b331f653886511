//! Redis-backed cache.
//!
//! Keys are stored as-is with a millisecond expiry; Redis evicts them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::CacheError;
use crate::ports::ReportCache;

/// Cache shared by every collector pointed at the same Redis database.
pub struct RedisCache {
    conn: ConnectionManager,
    closed: AtomicBool,
}

impl RedisCache {
    /// Connect to `url` (`redis://[:password@]host:port/db`) and check the
    /// server answers.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("Connected to Redis cache");
        Ok(Self {
            conn,
            closed: AtomicBool::new(false),
        })
    }

    fn conn(&self) -> Result<ConnectionManager, CacheError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(self.conn.clone())
        }
    }
}

/// Expiry in whole milliseconds, at least 1.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl ReportCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn()?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        let _: () = conn.pset_ex(key, value, ttl_millis(ttl)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn()?;
        let _: () = conn.del(key).await?;
        Ok(())
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
