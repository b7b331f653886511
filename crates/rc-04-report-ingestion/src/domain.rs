//! Intake and flush result types.

use std::fmt;
use std::time::Duration;

/// Default lifetime of the direct-cache marker.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// What intake did with one report. Every variant is a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeOutcome {
    /// Persisted synchronously.
    Stored,
    /// Buffered for the next flush.
    Enqueued,
    /// Same hash already buffered; nothing done.
    DuplicateBuffered,
    /// Same hash seen recently per the cache; nothing done.
    DuplicateCached,
    /// Storage already holds this hash.
    DuplicateStored,
}

impl IntakeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeOutcome::Stored => "stored",
            IntakeOutcome::Enqueued => "enqueued",
            IntakeOutcome::DuplicateBuffered => "duplicate_buffered",
            IntakeOutcome::DuplicateCached => "duplicate_cached",
            IntakeOutcome::DuplicateStored => "duplicate_stored",
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            IntakeOutcome::DuplicateBuffered
                | IntakeOutcome::DuplicateCached
                | IntakeOutcome::DuplicateStored
        )
    }
}

impl fmt::Display for IntakeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts from one or more flush cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Envelopes removed from the queue.
    pub dequeued: usize,
    /// Envelopes written to storage.
    pub persisted: usize,
    /// Envelopes storage already held.
    pub duplicates: usize,
    /// Envelopes whose save failed (dropped).
    pub failed: usize,
}

impl FlushSummary {
    /// Add another cycle's counts.
    pub fn merge(&mut self, other: FlushSummary) {
        self.dequeued += other.dequeued;
        self.persisted += other.persisted;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
    }

    pub fn is_empty(&self) -> bool {
        self.dequeued == 0
    }
}
