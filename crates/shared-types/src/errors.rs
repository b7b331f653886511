//! # Error Types
//!
//! Errors raised while encoding, decoding or dispatching reports.

use thiserror::Error;

/// Errors related to report (de)serialization and type dispatch.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report or envelope could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Payload did not match the schema registered for its type tag.
    #[error("Malformed {report_type} report: {message}")]
    Malformed {
        report_type: String,
        message: String,
    },

    /// No decoder registered for the type tag.
    #[error("Unsupported report type: {0}")]
    UnsupportedType(String),

    /// A decoder was registered twice for the same tag.
    #[error("Report type already registered: {0}")]
    DuplicateType(String),

    /// Type tag is empty or contains characters outside `[a-z0-9-]`.
    #[error("Invalid report type tag: {0:?}")]
    InvalidTag(String),

    /// Registry contains no decoders.
    #[error("Report registry is empty")]
    EmptyRegistry,
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}
