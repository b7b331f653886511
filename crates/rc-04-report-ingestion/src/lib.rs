//! # RC-04 Report Ingestion
//!
//! The ingestion-dedup-buffer pipeline.
//!
//! ## Architecture
//!
//! - **Domain** (`domain`): `IntakeOutcome`, `FlushSummary`
//! - **Ports** (`ports/`): `ReportIntake`, the driving port used by the
//!   HTTP gateway
//! - **Service** (`service`): `ReportService`, the intake decision logic
//! - **Flusher** (`flusher`): `BatchFlusher`, drains the queue into storage
//! - **Scheduler** (`scheduler`): cancellable periodic task driving the
//!   flusher
//! - **Metrics** (`metrics`): `MetricsRecorder` hooks
//!
//! ## Intake Decision
//!
//! ```text
//!                         canonical hash
//!                               │
//!         ┌─────────── buffering enabled? ───────────┐
//!         │ no                                        │ yes
//!         ▼                                  queue attached?
//!   store.save ─→ Stored / DuplicateStored    │ yes            │ no
//!                                             ▼                ▼
//!                                     queue.contains?     cache.get?
//!                                     hit → DuplicateBuffered  hit → DuplicateCached
//!                                     miss → enqueue           miss → store.save + cache.set
//! ```
//!
//! ## Guarantees
//!
//! - No path both enqueues and persists directly.
//! - The buffered path never touches the cache; buffering disabled never
//!   touches cache or queue.
//! - `contains` followed by `enqueue` is not atomic. Two concurrent identical
//!   submissions may both be enqueued; storage uniqueness absorbs the second
//!   at flush time.
//! - Flush is at-most-once: a failed item is logged and dropped.

pub mod domain;
pub mod error;
pub mod flusher;
pub mod metrics;
pub mod ports;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use domain::{FlushSummary, IntakeOutcome, DEFAULT_CACHE_TTL};
pub use error::{IntakeError, IntakeStage};
pub use flusher::BatchFlusher;
pub use metrics::{IntakeMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::ReportIntake;
pub use scheduler::{spawn_periodic, SchedulerHandle};
pub use service::ReportService;
