//! Storage adapters.

mod kv_store;

pub use kv_store::{open_report_store, KvReportStore};
