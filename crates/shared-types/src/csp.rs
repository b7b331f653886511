//! # Content-Security-Policy Reports
//!
//! Reporting API shape (`application/reports+json`) of a CSP violation.
//! Empty strings and zero numbers are omitted on serialization so that the
//! stored JSON and the identity subset only carry what the browser sent.

use serde::{Deserialize, Serialize};

/// Type tag of CSP reports, used in routes, envelopes and storage rows.
pub const CSP_REPORT_TYPE: &str = "csp";

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// A CSP violation report as submitted by a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CspReport {
    /// URL of the document that triggered the report.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Reporting API report type (e.g. `csp-violation`).
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub report_type: String,

    /// Violation details.
    #[serde(default)]
    pub body: CspReportBody,
}

/// Body of a CSP violation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CspReportBody {
    #[serde(rename = "documentURL", default, skip_serializing_if = "String::is_empty")]
    pub document_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub disposition: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub referrer: String,

    #[serde(rename = "effectiveDirective", default, skip_serializing_if = "String::is_empty")]
    pub effective_directive: String,

    #[serde(rename = "blockedURL", default, skip_serializing_if = "String::is_empty")]
    pub blocked_url: String,

    #[serde(rename = "originalPolicy", default, skip_serializing_if = "String::is_empty")]
    pub original_policy: String,

    #[serde(rename = "statusCode", default, skip_serializing_if = "is_zero")]
    pub status_code: i64,

    /// First characters of the offending inline script/style. Free text,
    /// never part of the identity.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sample: String,

    #[serde(rename = "sourceFile", default, skip_serializing_if = "String::is_empty")]
    pub source_file: String,

    #[serde(rename = "lineNumber", default, skip_serializing_if = "is_zero")]
    pub line_number: i64,

    #[serde(rename = "columnNumber", default, skip_serializing_if = "is_zero")]
    pub column_number: i64,
}

/// Identity subset of a CSP report.
///
/// Two reports with equal hash data describe the same violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CspReportHashData {
    #[serde(rename = "documentURL", skip_serializing_if = "String::is_empty")]
    pub document_url: String,

    #[serde(rename = "effectiveDirective", skip_serializing_if = "String::is_empty")]
    pub effective_directive: String,

    #[serde(rename = "blockedURL", skip_serializing_if = "String::is_empty")]
    pub blocked_url: String,

    #[serde(rename = "sourceFile", skip_serializing_if = "String::is_empty")]
    pub source_file: String,

    #[serde(rename = "lineNumber", skip_serializing_if = "is_zero")]
    pub line_number: i64,

    #[serde(rename = "columnNumber", skip_serializing_if = "is_zero")]
    pub column_number: i64,
}

impl CspReport {
    /// Extract the identity subset.
    pub fn hash_data(&self) -> CspReportHashData {
        CspReportHashData {
            document_url: self.body.document_url.clone(),
            effective_directive: self.body.effective_directive.clone(),
            blocked_url: self.body.blocked_url.clone(),
            source_file: self.body.source_file.clone(),
            line_number: self.body.line_number,
            column_number: self.body.column_number,
        }
    }
}
