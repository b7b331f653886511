//! Report store on a [`KeyValueStore`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared_store::{open_store, BatchOperation, KeyValueStore, StoreDriver};
use shared_types::Report;
use uuid::Uuid;

use crate::domain::{hash_key, row_key, StoredReport, ROW_PREFIX, SCHEMA_KEY, SCHEMA_VERSION};
use crate::error::StorageError;
use crate::ports::ReportStore;

/// Report store over any key-value backend.
///
/// The duplicate check and the insert run under one lock and the row plus
/// its hash index are one atomic batch, so the unique index holds even with
/// concurrent savers in this process.
pub struct KvReportStore<S: KeyValueStore> {
    store: Mutex<S>,
    migrated: AtomicBool,
}

impl<S: KeyValueStore> KvReportStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
            migrated: AtomicBool::new(false),
        }
    }

    /// Look up the stored row for `hash`.
    pub fn find_by_hash(&self, hash: &str) -> Result<Option<StoredReport>, StorageError> {
        let store = self.store.lock();
        let Some(id) = store.get(&hash_key(hash))? else {
            return Ok(None);
        };
        let id = String::from_utf8(id)
            .ok()
            .and_then(|s| Uuid::parse_str(&s).ok())
            .ok_or_else(|| StorageError::Corrupted(format!("bad row id in index for {}", hash)))?;

        match store.get(&row_key(&id))? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Corrupted(e.to_string())),
            None => Err(StorageError::Corrupted(format!(
                "index for {} points to missing row {}",
                hash, id
            ))),
        }
    }

    /// Number of stored reports.
    pub fn count(&self) -> Result<usize, StorageError> {
        Ok(self.store.lock().prefix_scan(ROW_PREFIX.as_bytes())?.len())
    }

    fn read_schema_version(store: &S) -> Result<Option<u32>, StorageError> {
        match store.get(SCHEMA_KEY)? {
            None => Ok(None),
            Some(bytes) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Some)
                .ok_or_else(|| StorageError::Corrupted("schema version is not a number".into())),
        }
    }
}

#[async_trait]
impl<S: KeyValueStore + 'static> ReportStore for KvReportStore<S> {
    async fn migrate(&self) -> Result<(), StorageError> {
        let mut store = self.store.lock();

        match Self::read_schema_version(&store)? {
            Some(found) if found > SCHEMA_VERSION => {
                return Err(StorageError::SchemaTooNew {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
            Some(found) if found == SCHEMA_VERSION => {
                tracing::debug!(version = found, "Report store schema up to date");
            }
            previous => {
                store.put(SCHEMA_KEY, SCHEMA_VERSION.to_string().as_bytes())?;
                tracing::info!(
                    from = ?previous,
                    to = SCHEMA_VERSION,
                    "Migrated report store schema"
                );
            }
        }

        self.migrated.store(true, Ordering::Release);
        Ok(())
    }

    async fn save(
        &self,
        report_type: &str,
        report: &Report,
        user_agent: &str,
        hash: &str,
    ) -> Result<(), StorageError> {
        if !self.migrated.load(Ordering::Acquire) {
            return Err(StorageError::NotMigrated);
        }

        let row = StoredReport {
            id: Uuid::now_v7(),
            report_type: report_type.to_string(),
            report: serde_json::to_value(report)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            user_agent: user_agent.to_string(),
            hash: hash.to_string(),
            created_at: Utc::now(),
        };
        let row_bytes =
            serde_json::to_vec(&row).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut store = self.store.lock();
        let index_key = hash_key(hash);
        if store.exists(&index_key)? {
            return Err(StorageError::Duplicate {
                hash: hash.to_string(),
            });
        }

        store.atomic_batch_write(vec![
            BatchOperation::put(row_key(&row.id), row_bytes),
            BatchOperation::put(index_key, row.id.to_string()),
        ])?;

        tracing::debug!(id = %row.id, report_type, hash, "Stored report");
        Ok(())
    }
}

/// Open a report store on the backend named by `driver`.
pub fn open_report_store(
    driver: StoreDriver,
    path: &Path,
) -> Result<KvReportStore<Box<dyn KeyValueStore>>, StorageError> {
    Ok(KvReportStore::new(open_store(driver, path)?))
}
