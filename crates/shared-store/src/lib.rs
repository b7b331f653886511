//! # Shared Store
//!
//! Synchronous key-value port and its adapters. Report storage and the
//! persistent queue are both built on top of [`KeyValueStore`].
//!
//! ## Adapters
//!
//! | Driver | Type | Durability |
//! |--------|------|------------|
//! | `memory` | [`InMemoryKVStore`] | process lifetime |
//! | `file` | [`FileBackedKVStore`] | single file, rewritten per mutation |
//! | `rocksdb` | `RocksDbStore` (feature `rocksdb`) | WAL + SST |
//!
//! ## Atomicity
//!
//! `atomic_batch_write` applies every operation or none. Callers that need
//! paired effects (row + unique index, queue item + counters) express them as
//! one batch.

pub mod adapters;
pub mod driver;
pub mod errors;
pub mod ports;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use driver::{open_store, StoreDriver};
pub use errors::KVStoreError;
pub use ports::{BatchOperation, KeyValueStore};
