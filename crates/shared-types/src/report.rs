//! # Report Capability
//!
//! The closed set of report schemas the collector understands.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::csp::{CspReport, CSP_REPORT_TYPE};
use crate::errors::ReportError;

/// A decoded browser report.
///
/// Serializes as the inner report (no tag wrapper); the type tag travels
/// separately in routes, envelopes and storage rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Content-Security-Policy violation.
    Csp(CspReport),
}

impl Report {
    /// Type tag of this report.
    pub fn report_type(&self) -> &'static str {
        match self {
            Report::Csp(_) => CSP_REPORT_TYPE,
        }
    }

    /// Serialize the full report to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, ReportError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Identity subset as a JSON value, ready for canonical hashing.
    pub fn hash_data(&self) -> Result<Value, ReportError> {
        match self {
            Report::Csp(report) => Ok(serde_json::to_value(report.hash_data())?),
        }
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Report::Csp(report) => report.serialize(serializer),
        }
    }
}

impl From<CspReport> for Report {
    fn from(report: CspReport) -> Self {
        Report::Csp(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csp::CspReportBody;

    #[test]
    fn test_report_serializes_without_tag() {
        let report = Report::Csp(CspReport {
            url: "https://a.test".into(),
            ..Default::default()
        });

        let json: Value = serde_json::from_slice(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["url"], "https://a.test");
        assert!(json.get("Csp").is_none());
    }

    #[test]
    fn test_hash_data_ignores_non_identity_fields() {
        let report = Report::Csp(CspReport {
            url: "https://a.test".into(),
            body: CspReportBody {
                blocked_url: "https://evil.test/x.js".into(),
                sample: "alert(1)".into(),
                ..Default::default()
            },
            ..Default::default()
        });

        let data = report.hash_data().unwrap();
        assert_eq!(data, serde_json::json!({"blockedURL": "https://evil.test/x.js"}));
        assert_eq!(report.report_type(), "csp");
    }
}
