//! Queue on a shared Redis database.
//!
//! ## Key Layout
//!
//! | Key | Type | Content |
//! |-----|------|---------|
//! | `queue:<name>` | list | envelope JSON, pushed left, popped right |
//! | `queue:<name>:hashes` | hash | report hash → buffered count |
//!
//! Enqueue is a `MULTI` of `LPUSH` and `HINCRBY`. Dequeue runs as one Lua
//! script that pops items and decrements their counts, so no other client
//! observes an item gone while its hash is still counted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use shared_types::{ReportEnvelope, ReportRegistry};

use crate::error::QueueError;
use crate::ports::ReportQueue;

const DEQUEUE_SCRIPT: &str = r#"
local items = {}
for _ = 1, tonumber(ARGV[1]) do
  local item = redis.call('RPOP', KEYS[1])
  if not item then break end
  local ok, decoded = pcall(cjson.decode, item)
  if ok and type(decoded) == 'table' and type(decoded['hash']) == 'string' then
    local left = redis.call('HINCRBY', KEYS[2], decoded['hash'], -1)
    if left <= 0 then
      redis.call('HDEL', KEYS[2], decoded['hash'])
    end
  end
  items[#items + 1] = item
end
return items
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RedisKeys {
    list: String,
    hashes: String,
}

impl RedisKeys {
    fn new(name: &str) -> Self {
        Self {
            list: format!("queue:{name}"),
            hashes: format!("queue:{name}:hashes"),
        }
    }
}

/// FIFO queue that several collectors can share.
pub struct RedisQueue {
    conn: ConnectionManager,
    keys: RedisKeys,
    dequeue: Script,
    registry: Arc<ReportRegistry>,
    name: String,
    closed: AtomicBool,
}

impl RedisQueue {
    /// Connect to `url` and open the queue `name`. Existing items are kept.
    pub async fn connect(
        url: &str,
        name: &str,
        registry: Arc<ReportRegistry>,
    ) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        let keys = RedisKeys::new(name);
        let buffered: usize = conn.llen(&keys.list).await?;
        tracing::info!(queue = name, buffered, "Opened Redis queue");

        Ok(Self {
            conn,
            keys,
            dequeue: Script::new(DEQUEUE_SCRIPT),
            registry,
            name: name.to_string(),
            closed: AtomicBool::new(false),
        })
    }

    fn conn(&self) -> Result<ConnectionManager, QueueError> {
        if self.closed.load(Ordering::Acquire) {
            Err(QueueError::Closed)
        } else {
            Ok(self.conn.clone())
        }
    }
}

#[async_trait]
impl ReportQueue for RedisQueue {
    async fn enqueue(&self, envelope: ReportEnvelope) -> Result<(), QueueError> {
        let mut conn = self.conn()?;
        let payload = envelope.to_json()?;

        let _: () = redis::pipe()
            .atomic()
            .lpush(&self.keys.list, payload)
            .ignore()
            .hincr(&self.keys.hashes, &envelope.hash, 1)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn dequeue_n(&self, n: usize) -> Result<Vec<ReportEnvelope>, QueueError> {
        let mut conn = self.conn()?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let payloads: Vec<Vec<u8>> = self
            .dequeue
            .key(&self.keys.list)
            .key(&self.keys.hashes)
            .arg(n)
            .invoke_async(&mut conn)
            .await?;

        let mut drained = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match ReportEnvelope::from_json(&payload, &self.registry) {
                Ok(envelope) => drained.push(envelope),
                Err(e) => tracing::error!(
                    queue = %self.name,
                    error = %e,
                    "Dropping undecodable queue item"
                ),
            }
        }
        Ok(drained)
    }

    async fn size(&self) -> Result<usize, QueueError> {
        let mut conn = self.conn()?;
        let len: usize = conn.llen(&self.keys.list).await?;
        Ok(len)
    }

    async fn contains(&self, hash: &str) -> Result<bool, QueueError> {
        let mut conn = self.conn()?;
        let found: bool = conn.hexists(&self.keys.hashes, hash).await?;
        Ok(found)
    }

    async fn close(&self) -> Result<(), QueueError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(queue = %self.name, "Closed Redis queue");
        }
        Ok(())
    }
}
