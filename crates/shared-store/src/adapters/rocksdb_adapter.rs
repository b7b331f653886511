//! # RocksDB Adapter
//!
//! `KeyValueStore` over one RocksDB database. Batches map onto a
//! `WriteBatch`, so the row/index and item/counter pairs written by report
//! storage and the persistent queue land together or not at all.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use rocksdb::{
    BlockBasedOptions, Cache, DBCompressionType, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};

use crate::errors::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore};

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    pub path: PathBuf,
    /// LRU block cache, bytes.
    pub block_cache_size: usize,
    /// Memtable size, bytes.
    pub write_buffer_size: usize,
    /// fsync the WAL on every write.
    pub sync_writes: bool,
}

impl RocksDbConfig {
    /// Defaults sized for a single collector: 8 MiB cache, 4 MiB memtable,
    /// synced writes.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: true,
        }
    }

    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    fn options(&self) -> Options {
        let mut table = BlockBasedOptions::default();
        // Hash index and queue membership are point lookups.
        table.set_bloom_filter(10.0, false);
        table.set_block_cache(&Cache::new_lru_cache(self.block_cache_size));

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);
        opts.set_block_based_table_factory(&table);
        opts
    }
}

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: DB,
    write_opts: WriteOptions,
}

impl RocksDbStore {
    pub fn open(config: &RocksDbConfig) -> Result<Self, KVStoreError> {
        let db = DB::open(&config.options(), &config.path).map_err(io_err("open"))?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(config.sync_writes);

        tracing::info!(path = %config.path.display(), "Opened RocksDB store");
        Ok(Self { db, write_opts })
    }

    /// Open `path` with [`RocksDbConfig::new`] defaults.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, KVStoreError> {
        Self::open(&RocksDbConfig::new(path.as_ref()))
    }
}

fn io_err<E: Display>(op: &'static str) -> impl Fn(E) -> KVStoreError {
    move |e| KVStoreError::IOError {
        message: format!("RocksDB {op} failed: {e}"),
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(io_err("get"))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .put_opt(key, value, &self.write_opts)
            .map_err(io_err("put"))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .delete_opt(key, &self.write_opts)
            .map_err(io_err("delete"))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(key, value),
                BatchOperation::Delete { key } => batch.delete(key),
            }
        }
        self.db
            .write_opt(batch, &self.write_opts)
            .map_err(io_err("batch write"))
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.db
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(io_err("exists"))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let mut entries = Vec::new();
        for item in self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(io_err("scan"))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.into_vec(), value.into_vec()));
        }
        Ok(entries)
    }
}
