//! # Report Registry
//!
//! Maps a type tag to the decoder for that report schema. Built once at
//! startup, validated, then shared read-only by the gateway and the
//! persistent queue.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::csp::{CspReport, CSP_REPORT_TYPE};
use crate::errors::ReportError;
use crate::report::Report;

/// Decoder turning a raw JSON payload into a [`Report`].
pub type ReportDecoder = fn(Value) -> Result<Report, ReportError>;

/// Registry of supported report types.
#[derive(Debug, Clone, Default)]
pub struct ReportRegistry {
    decoders: BTreeMap<String, ReportDecoder>,
}

impl ReportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in report type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.decoders.insert(CSP_REPORT_TYPE.to_string(), decode_csp);
        registry
    }

    /// Register a decoder. Fails if the tag is already taken or malformed.
    pub fn register(&mut self, tag: &str, decoder: ReportDecoder) -> Result<(), ReportError> {
        validate_tag(tag)?;
        if self.decoders.contains_key(tag) {
            return Err(ReportError::DuplicateType(tag.to_string()));
        }
        self.decoders.insert(tag.to_string(), decoder);
        Ok(())
    }

    /// Startup check: at least one decoder and every tag well formed.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.decoders.is_empty() {
            return Err(ReportError::EmptyRegistry);
        }
        for tag in self.decoders.keys() {
            validate_tag(tag)?;
        }
        Ok(())
    }

    /// Whether a decoder is registered for `tag`.
    pub fn supports(&self, tag: &str) -> bool {
        self.decoders.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    /// Decode `payload` as a report of type `tag`.
    pub fn decode(&self, tag: &str, payload: Value) -> Result<Report, ReportError> {
        let decoder = self
            .decoders
            .get(tag)
            .ok_or_else(|| ReportError::UnsupportedType(tag.to_string()))?;
        decoder(payload)
    }
}

fn validate_tag(tag: &str) -> Result<(), ReportError> {
    let well_formed = !tag.is_empty()
        && tag
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if well_formed {
        Ok(())
    } else {
        Err(ReportError::InvalidTag(tag.to_string()))
    }
}

fn decode_csp(payload: Value) -> Result<Report, ReportError> {
    if !payload.is_object() {
        return Err(ReportError::Malformed {
            report_type: CSP_REPORT_TYPE.to_string(),
            message: "expected a JSON object".to_string(),
        });
    }
    serde_json::from_value::<CspReport>(payload)
        .map(Report::Csp)
        .map_err(|e| ReportError::Malformed {
            report_type: CSP_REPORT_TYPE.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_decode_csp() {
        let registry = ReportRegistry::with_defaults();
        registry.validate().unwrap();

        let report = registry
            .decode("csp", json!({"body": {"blockedURL": "https://x.test"}}))
            .unwrap();
        match report {
            Report::Csp(csp) => assert_eq!(csp.body.blocked_url, "https://x.test"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let registry = ReportRegistry::with_defaults();
        let err = registry.decode("nel", json!({})).unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedType(t) if t == "nel"));
        assert!(!registry.supports("nel"));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = ReportRegistry::with_defaults();
        let err = registry.register("csp", decode_csp).unwrap_err();
        assert!(matches!(err, ReportError::DuplicateType(_)));
    }

    #[test]
    fn test_malformed_tag_is_rejected() {
        let mut registry = ReportRegistry::new();
        assert!(matches!(
            registry.register("CSP Report", decode_csp),
            Err(ReportError::InvalidTag(_))
        ));
        assert!(matches!(registry.register("", decode_csp), Err(ReportError::InvalidTag(_))));
    }

    #[test]
    fn test_empty_registry_fails_validation() {
        assert!(matches!(
            ReportRegistry::new().validate(),
            Err(ReportError::EmptyRegistry)
        ));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let registry = ReportRegistry::with_defaults();
        let err = registry
            .decode("csp", json!({"body": {"lineNumber": "forty-two"}}))
            .unwrap_err();
        assert!(matches!(err, ReportError::Malformed { .. }));

        let err = registry.decode("csp", json!("just a string")).unwrap_err();
        assert!(matches!(err, ReportError::Malformed { .. }));
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = ReportRegistry::new();
        registry.register("csp-legacy", decode_csp).unwrap();
        registry.validate().unwrap();
        assert_eq!(registry.types().collect::<Vec<_>>(), vec!["csp-legacy"]);
    }
}
