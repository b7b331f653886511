//! # Report Collector Runtime
//!
//! Wires the pipeline crates into one process.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and backend construction
//! - `adapters/` - Prometheus-backed metrics recorder
//! - `runtime` - `CollectorRuntime` lifecycle
//!
//! ## Flow
//!
//! ```text
//! HTTP ──→ Gateway(rc-05) ──→ ReportService(rc-04) ──┬──→ Queue(rc-01) ──→ BatchFlusher ──→ Storage(rc-02)
//!                                                     ├──→ Cache(rc-03) + Storage(rc-02)
//!                                                     └──→ Storage(rc-02)
//! ```

pub mod adapters;
pub mod container;
pub mod runtime;

pub use container::{CollectorConfig, Components, ConfigError};
pub use runtime::CollectorRuntime;
