//! In-memory queue.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::ReportEnvelope;

use crate::error::QueueError;
use crate::ports::ReportQueue;

/// Process-scoped queue. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    inner: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<ReportEnvelope>,
    hashes: HashMap<String, usize>,
    closed: bool,
}

impl QueueState {
    fn ensure_open(&self) -> Result<(), QueueError> {
        if self.closed {
            Err(QueueError::Closed)
        } else {
            Ok(())
        }
    }

    fn release(&mut self, hash: &str) {
        if let Some(count) = self.hashes.get_mut(hash) {
            *count -= 1;
            if *count == 0 {
                self.hashes.remove(hash);
            }
        }
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportQueue for InMemoryQueue {
    async fn enqueue(&self, envelope: ReportEnvelope) -> Result<(), QueueError> {
        let mut state = self.inner.lock();
        state.ensure_open()?;

        *state.hashes.entry(envelope.hash.clone()).or_insert(0) += 1;
        state.items.push_back(envelope);
        Ok(())
    }

    async fn dequeue_n(&self, n: usize) -> Result<Vec<ReportEnvelope>, QueueError> {
        let mut state = self.inner.lock();
        state.ensure_open()?;

        let take = n.min(state.items.len());
        let drained: Vec<ReportEnvelope> = state.items.drain(..take).collect();
        for envelope in &drained {
            state.release(&envelope.hash);
        }
        Ok(drained)
    }

    async fn size(&self) -> Result<usize, QueueError> {
        let state = self.inner.lock();
        state.ensure_open()?;
        Ok(state.items.len())
    }

    async fn contains(&self, hash: &str) -> Result<bool, QueueError> {
        let state = self.inner.lock();
        state.ensure_open()?;
        Ok(state.hashes.contains_key(hash))
    }

    async fn close(&self) -> Result<(), QueueError> {
        let mut state = self.inner.lock();
        state.closed = true;
        state.items.clear();
        state.hashes.clear();
        Ok(())
    }
}
