//! Queue port.

use async_trait::async_trait;
use shared_types::ReportEnvelope;

use crate::error::QueueError;

/// FIFO buffer of pending report envelopes with hash-membership lookup.
///
/// Implementations serialize all operations; `enqueue` and `dequeue_n` each
/// update the sequence and the membership set as one atomic step.
#[async_trait]
pub trait ReportQueue: Send + Sync {
    /// Append an envelope to the tail and record its hash.
    async fn enqueue(&self, envelope: ReportEnvelope) -> Result<(), QueueError>;

    /// Remove and return up to `n` envelopes from the head, oldest first.
    ///
    /// Returns fewer (down to zero) when fewer are buffered.
    async fn dequeue_n(&self, n: usize) -> Result<Vec<ReportEnvelope>, QueueError>;

    /// Number of buffered envelopes.
    async fn size(&self) -> Result<usize, QueueError>;

    /// Whether an envelope with `hash` is currently buffered.
    async fn contains(&self, hash: &str) -> Result<bool, QueueError>;

    /// Release backend resources. Later operations fail with `Closed`.
    async fn close(&self) -> Result<(), QueueError>;
}
