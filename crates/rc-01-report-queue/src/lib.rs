//! # RC-01 Report Queue
//!
//! Buffers report envelopes between intake and the batch flusher.
//!
//! ## Architecture
//!
//! - **Ports Layer** (`ports`): `ReportQueue`, the port consumed by intake
//!   and the flusher
//! - **Adapters Layer** (`adapters/`):
//!   - `InMemoryQueue`: `VecDeque` + hash counts, process lifetime
//!   - `PersistentQueue`: sequence-numbered keys on any `KeyValueStore`,
//!     survives restarts
//!   - `RedisQueue` (feature `redis`): list + hash counts on a shared Redis,
//!     usable by several collectors at once
//! - **Driver** (`driver`): backend selection by name
//!
//! ## Invariants
//!
//! - Strict FIFO: drain order equals enqueue order.
//! - Membership: `contains(hash)` is true iff an envelope with that hash is
//!   currently buffered. Hashes are counted, so two buffered envelopes with
//!   one hash keep the hash visible until both are drained.
//! - Paired effects (item + membership) are applied atomically.
//! - After `close()`, every operation fails with `QueueError::Closed`.

pub mod adapters;
pub mod driver;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::{InMemoryQueue, PersistentQueue};
#[cfg(feature = "redis")]
pub use adapters::RedisQueue;
pub use driver::{open_queue, QueueDriver, QueueOptions};
pub use error::QueueError;
pub use ports::ReportQueue;
