//! # Report Envelope
//!
//! The unit buffered in the queue between intake and batch flush.
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "type": "csp",
//!   "user_agent": "Mozilla/5.0 ...",
//!   "hash": "<64 lowercase hex chars>",
//!   "report": { ... },
//!   "timestamp": "2025-01-01T00:00:00Z"
//! }
//! ```
//!
//! Decoding re-dispatches `report` through the [`ReportRegistry`] on `type`,
//! so an envelope written by one process can be drained by another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ReportError;
use crate::registry::ReportRegistry;
use crate::report::Report;

/// A report waiting in the queue, with its intake metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEnvelope {
    /// Type tag of the report.
    pub report_type: String,
    /// Submitter `User-Agent`, empty when absent.
    pub user_agent: String,
    /// Canonical fingerprint of the report's identity fields.
    pub hash: String,
    /// The report itself.
    pub report: Report,
    /// Intake time (UTC).
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct WireEnvelopeRef<'a> {
    #[serde(rename = "type")]
    report_type: &'a str,
    user_agent: &'a str,
    hash: &'a str,
    report: &'a Report,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    report_type: String,
    #[serde(default)]
    user_agent: String,
    hash: String,
    report: Value,
    timestamp: DateTime<Utc>,
}

impl ReportEnvelope {
    /// Wrap a report accepted under `report_type`, stamping it with the
    /// current UTC time.
    pub fn new(
        report_type: impl Into<String>,
        report: Report,
        user_agent: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            report_type: report_type.into(),
            user_agent: user_agent.into(),
            hash: hash.into(),
            report,
            timestamp: Utc::now(),
        }
    }

    /// Encode to the JSON wire format.
    pub fn to_json(&self) -> Result<Vec<u8>, ReportError> {
        let wire = WireEnvelopeRef {
            report_type: &self.report_type,
            user_agent: &self.user_agent,
            hash: &self.hash,
            report: &self.report,
            timestamp: self.timestamp,
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Decode from the JSON wire format, dispatching the payload by type tag.
    pub fn from_json(bytes: &[u8], registry: &ReportRegistry) -> Result<Self, ReportError> {
        let wire: WireEnvelope = serde_json::from_slice(bytes)?;
        let report = registry.decode(&wire.report_type, wire.report)?;
        Ok(Self {
            report_type: wire.report_type,
            user_agent: wire.user_agent,
            hash: wire.hash,
            report,
            timestamp: wire.timestamp,
        })
    }

    /// Best-effort extraction of the `hash` field from a payload that no
    /// longer decodes as a full envelope.
    pub fn peek_hash(bytes: &[u8]) -> Option<String> {
        #[derive(Deserialize)]
        struct HashOnly {
            hash: String,
        }
        serde_json::from_slice::<HashOnly>(bytes).ok().map(|h| h.hash)
    }
}
