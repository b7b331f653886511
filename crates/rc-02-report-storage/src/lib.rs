//! # RC-02 Report Storage
//!
//! The authoritative persistence layer for accepted reports.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Unique Hash | At most one row per canonical report hash |
//! | 2 | Atomic Writes | Row and hash index are written in one batch |
//! | 3 | Migrated Before Use | `save` fails until `migrate` has run |
//! | 4 | No Downgrade | A store written by a newer schema is refused |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain` - `StoredReport` row and schema constants
//! - `ports` - `ReportStore`, the port consumed by intake and the flusher
//! - `adapters/` - `KvReportStore` on any `KeyValueStore`
//!
//! ## Usage
//!
//! ```ignore
//! use rc_02_report_storage::{KvReportStore, ReportStore};
//! use shared_store::InMemoryKVStore;
//!
//! let store = KvReportStore::new(InMemoryKVStore::new());
//! store.migrate().await?;
//! store.save("csp", &report, "Mozilla/5.0", &hash).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::{open_report_store, KvReportStore};
pub use domain::{StoredReport, SCHEMA_VERSION};
pub use error::StorageError;
pub use ports::ReportStore;
