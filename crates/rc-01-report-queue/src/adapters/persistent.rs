//! Persistent queue over a [`KeyValueStore`].
//!
//! ## Key Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `queue:<name>:head` | sequence number of the oldest item |
//! | `queue:<name>:tail` | sequence number of the next enqueue |
//! | `queue:<name>:item:<seq:020>` | envelope JSON |
//! | `queue:<name>:hash:<hash>` | number of buffered items with that hash |
//!
//! Counters are decimal ASCII. Every enqueue and dequeue is a single
//! `atomic_batch_write`, so a crash never leaves an item without its
//! membership entry or the reverse.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_store::{BatchOperation, KeyValueStore};
use shared_types::{ReportEnvelope, ReportRegistry};

use crate::error::QueueError;
use crate::ports::ReportQueue;

struct QueueKeys {
    head: Vec<u8>,
    tail: Vec<u8>,
    item_prefix: String,
    hash_prefix: String,
}

impl QueueKeys {
    fn new(name: &str) -> Self {
        Self {
            head: format!("queue:{}:head", name).into_bytes(),
            tail: format!("queue:{}:tail", name).into_bytes(),
            item_prefix: format!("queue:{}:item:", name),
            hash_prefix: format!("queue:{}:hash:", name),
        }
    }

    fn item(&self, seq: u64) -> Vec<u8> {
        format!("{}{:020}", self.item_prefix, seq).into_bytes()
    }

    fn hash(&self, hash: &str) -> Vec<u8> {
        format!("{}{}", self.hash_prefix, hash).into_bytes()
    }
}

/// Durable FIFO queue backed by any key-value store.
pub struct PersistentQueue<S: KeyValueStore> {
    store: Mutex<Option<S>>,
    keys: QueueKeys,
    registry: Arc<ReportRegistry>,
    name: String,
}

impl<S: KeyValueStore> PersistentQueue<S> {
    /// Open the queue `name` on `store`. Existing items are kept.
    ///
    /// `registry` decodes envelopes on dequeue.
    pub fn open(store: S, name: &str, registry: Arc<ReportRegistry>) -> Result<Self, QueueError> {
        let keys = QueueKeys::new(name);
        let head = read_counter(&store, &keys.head)?;
        let tail = read_counter(&store, &keys.tail)?;
        if head > tail {
            return Err(QueueError::Corrupted(format!(
                "head {} is past tail {} for queue {}",
                head, tail, name
            )));
        }

        tracing::info!(queue = name, buffered = tail - head, "Opened persistent queue");

        Ok(Self {
            store: Mutex::new(Some(store)),
            keys,
            registry,
            name: name.to_string(),
        })
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut S, &QueueKeys) -> Result<T, QueueError>,
    ) -> Result<T, QueueError> {
        let mut guard = self.store.lock();
        let store = guard.as_mut().ok_or(QueueError::Closed)?;
        f(store, &self.keys)
    }
}

fn read_counter<S: KeyValueStore + ?Sized>(store: &S, key: &[u8]) -> Result<u64, QueueError> {
    match store.get(key)? {
        None => Ok(0),
        Some(bytes) => std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                QueueError::Corrupted(format!(
                    "counter {} is not a number",
                    String::from_utf8_lossy(key)
                ))
            }),
    }
}

fn counter_bytes(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}

#[async_trait]
impl<S: KeyValueStore + 'static> ReportQueue for PersistentQueue<S> {
    async fn enqueue(&self, envelope: ReportEnvelope) -> Result<(), QueueError> {
        let payload = envelope.to_json()?;

        self.with_store(|store, keys| {
            let seq = read_counter(store, &keys.tail)?;
            let hash_key = keys.hash(&envelope.hash);
            let count = read_counter(store, &hash_key)?;

            store.atomic_batch_write(vec![
                BatchOperation::put(keys.item(seq), payload),
                BatchOperation::put(keys.tail.clone(), counter_bytes(seq + 1)),
                BatchOperation::put(hash_key, counter_bytes(count + 1)),
            ])?;
            Ok(())
        })
    }

    async fn dequeue_n(&self, n: usize) -> Result<Vec<ReportEnvelope>, QueueError> {
        if n == 0 {
            return self.with_store(|_, _| Ok(Vec::new()));
        }

        self.with_store(|store, keys| {
            let head = read_counter(store, &keys.head)?;
            let tail = read_counter(store, &keys.tail)?;
            let end = tail.min(head.saturating_add(n as u64));

            let mut ops = Vec::new();
            let mut released: HashMap<String, u64> = HashMap::new();
            let mut drained = Vec::new();

            for seq in head..end {
                let item_key = keys.item(seq);
                let Some(payload) = store.get(&item_key)? else {
                    tracing::error!(queue = %self.name, seq, "Queue item missing, skipping");
                    continue;
                };
                ops.push(BatchOperation::delete(item_key));

                match ReportEnvelope::from_json(&payload, &self.registry) {
                    Ok(envelope) => {
                        *released.entry(envelope.hash.clone()).or_insert(0) += 1;
                        drained.push(envelope);
                    }
                    Err(e) => {
                        tracing::error!(
                            queue = %self.name,
                            seq,
                            error = %e,
                            "Dropping undecodable queue item"
                        );
                        if let Some(hash) = ReportEnvelope::peek_hash(&payload) {
                            *released.entry(hash).or_insert(0) += 1;
                        }
                    }
                }
            }

            for (hash, taken) in released {
                let hash_key = keys.hash(&hash);
                let remaining = read_counter(store, &hash_key)?.saturating_sub(taken);
                if remaining == 0 {
                    ops.push(BatchOperation::delete(hash_key));
                } else {
                    ops.push(BatchOperation::put(hash_key, counter_bytes(remaining)));
                }
            }

            if end > head {
                ops.push(BatchOperation::put(keys.head.clone(), counter_bytes(end)));
                store.atomic_batch_write(ops)?;
            }
            Ok(drained)
        })
    }

    async fn size(&self) -> Result<usize, QueueError> {
        self.with_store(|store, keys| {
            let head = read_counter(store, &keys.head)?;
            let tail = read_counter(store, &keys.tail)?;
            Ok(tail.saturating_sub(head) as usize)
        })
    }

    async fn contains(&self, hash: &str) -> Result<bool, QueueError> {
        self.with_store(|store, keys| Ok(store.exists(&keys.hash(hash))?))
    }

    async fn close(&self) -> Result<(), QueueError> {
        let store = self.store.lock().take();
        if store.is_some() {
            tracing::info!(queue = %self.name, "Closed persistent queue");
        }
        Ok(())
    }
}
