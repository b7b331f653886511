//! Test doubles for the ingestion collaborators.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rc_01_report_queue::{InMemoryQueue, QueueError, ReportQueue};
use rc_02_report_storage::{ReportStore, StorageError};
use rc_03_report_cache::{CacheError, InMemoryCache, ReportCache};
use shared_store::KVStoreError;
use shared_types::{CspReport, CspReportBody, Report, ReportEnvelope};
use tokio::sync::Barrier;

/// CSP report whose identity differs by `blocked`.
pub fn csp_report(blocked: &str) -> Report {
    Report::Csp(CspReport {
        url: "https://example.com/page".into(),
        report_type: "csp-violation".into(),
        body: CspReportBody {
            document_url: "https://example.com/page".into(),
            blocked_url: blocked.into(),
            effective_directive: "script-src-elem".into(),
            disposition: "enforce".into(),
            ..Default::default()
        },
    })
}

/// One recorded `save` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub report_type: String,
    pub user_agent: String,
    pub hash: String,
}

/// Report store that records saves, enforces hash uniqueness and fails on
/// chosen hashes.
#[derive(Default)]
pub struct MockStore {
    saved: Mutex<Vec<SavedReport>>,
    hashes: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `hash` as already stored.
    pub fn preload(&self, hash: &str) {
        self.hashes.lock().insert(hash.to_string());
    }

    /// Make every save of `hash` fail with a database error.
    pub fn fail_on(&self, hash: &str) {
        self.failing.lock().insert(hash.to_string());
    }

    /// Number of `save` calls, successful or not.
    pub fn save_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<SavedReport> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl ReportStore for MockStore {
    async fn migrate(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn save(
        &self,
        report_type: &str,
        _report: &Report,
        user_agent: &str,
        hash: &str,
    ) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.failing.lock().contains(hash) {
            return Err(StorageError::Database(KVStoreError::IOError {
                message: "injected failure".into(),
            }));
        }
        if !self.hashes.lock().insert(hash.to_string()) {
            return Err(StorageError::Duplicate {
                hash: hash.to_string(),
            });
        }

        self.saved.lock().push(SavedReport {
            report_type: report_type.to_string(),
            user_agent: user_agent.to_string(),
            hash: hash.to_string(),
        });
        Ok(())
    }
}

/// In-memory cache that counts calls made through the port.
pub struct CountingCache {
    inner: InMemoryCache,
    calls: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self {
            inner: InMemoryCache::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportCache for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        self.inner.purge_expired().await
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.inner.close().await
    }
}

/// In-memory queue whose `contains` answers only once `parties` callers are
/// waiting in it, so concurrent intakes all see the same membership.
pub struct GatedQueue {
    inner: InMemoryQueue,
    gate: Barrier,
}

impl GatedQueue {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryQueue::new(),
            gate: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl ReportQueue for GatedQueue {
    async fn enqueue(&self, envelope: ReportEnvelope) -> Result<(), QueueError> {
        self.inner.enqueue(envelope).await
    }

    async fn dequeue_n(&self, n: usize) -> Result<Vec<ReportEnvelope>, QueueError> {
        self.inner.dequeue_n(n).await
    }

    async fn size(&self) -> Result<usize, QueueError> {
        self.inner.size().await
    }

    async fn contains(&self, hash: &str) -> Result<bool, QueueError> {
        self.gate.wait().await;
        self.inner.contains(hash).await
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.inner.close().await
    }
}
