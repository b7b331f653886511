//! Origin allow-list.
//!
//! A pattern without `*` must equal the submitting page's host. Otherwise it
//! is compiled to an anchored regex in which `*` matches one or more
//! characters other than `.`, so `*.example.com` admits `app.example.com`
//! but neither `example.com` nor `a.b.example.com`. Matching runs in time
//! linear in the host length.

use axum::http::{StatusCode, Uri};
use regex::Regex;

use crate::domain::error::GatewayError;

/// One allowed host pattern.
#[derive(Debug, Clone)]
pub struct DomainPattern {
    pattern: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact,
    Wildcard(Regex),
}

impl PartialEq for DomainPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for DomainPattern {}

impl DomainPattern {
    pub fn parse(pattern: &str) -> Result<Self, GatewayError> {
        let invalid = |reason| GatewayError::InvalidDomainPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty pattern"));
        }

        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(invalid("empty label"));
            }
            if !label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '*'))
            {
                return Err(invalid("invalid character"));
            }
        }

        let matcher = if trimmed.contains('*') {
            let body = trimmed
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join("[^.]+");
            let regex = Regex::new(&format!("^{body}$"))
                .map_err(|_| invalid("pattern does not compile"))?;
            Matcher::Wildcard(regex)
        } else {
            Matcher::Exact
        };

        Ok(Self {
            pattern: trimmed.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, host: &str) -> bool {
        match &self.matcher {
            Matcher::Exact => host == self.pattern,
            Matcher::Wildcard(regex) => regex.is_match(host),
        }
    }
}

/// Why a report submission was refused by the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginRejection {
    /// Neither `Origin` nor `Referer` was sent.
    Missing,
    /// The header value is not a URL.
    Invalid,
    /// The host matches no allowed pattern.
    NotAllowed { host: String },
}

impl OriginRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            OriginRejection::Missing | OriginRejection::Invalid => StatusCode::BAD_REQUEST,
            OriginRejection::NotAllowed { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            OriginRejection::Missing => "missing origin or referer header",
            OriginRejection::Invalid => "invalid origin or referer header",
            OriginRejection::NotAllowed { .. } => "origin not allowed",
        }
    }
}

/// Set of allowed host patterns. An empty policy admits every request.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    patterns: Vec<DomainPattern>,
}

impl OriginPolicy {
    pub fn new(patterns: Vec<DomainPattern>) -> Self {
        Self { patterns }
    }

    /// Build from raw entries. Blank entries are skipped.
    pub fn from_domains<I, S>(domains: I) -> Result<Self, GatewayError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = domains
            .into_iter()
            .filter(|d| !d.as_ref().trim().is_empty())
            .map(|d| DomainPattern::parse(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    pub fn allows_all(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check the submitting page URL (`Origin`, or `Referer` when absent).
    pub fn check(&self, origin: Option<&str>) -> Result<(), OriginRejection> {
        if self.allows_all() {
            return Ok(());
        }

        let origin = match origin {
            Some(value) if !value.is_empty() => value,
            _ => return Err(OriginRejection::Missing),
        };
        let uri: Uri = origin.parse().map_err(|_| OriginRejection::Invalid)?;

        // A value without a scheme has no host to compare.
        let host = uri.scheme().and(uri.host()).unwrap_or_default();
        if self.patterns.iter().any(|p| p.matches(host)) {
            Ok(())
        } else {
            Err(OriginRejection::NotAllowed {
                host: host.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(domains: &[&str]) -> OriginPolicy {
        OriginPolicy::from_domains(domains).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let p = DomainPattern::parse("example.com").unwrap();
        assert!(p.matches("example.com"));
        assert!(!p.matches("app.example.com"));
        assert!(!p.matches("example.org"));
    }

    #[test]
    fn test_wildcard_matches_one_label() {
        let p = DomainPattern::parse("*.example.com").unwrap();
        assert!(p.matches("app.example.com"));
        assert!(!p.matches("example.com"));
        assert!(!p.matches("a.b.example.com"));
        assert!(!p.matches(".example.com"));
    }

    #[test]
    fn test_wildcard_inside_label() {
        let p = DomainPattern::parse("app-*.example.com").unwrap();
        assert!(p.matches("app-eu.example.com"));
        assert!(!p.matches("app-.example.com"));
        assert!(!p.matches("web-eu.example.com"));
    }

    #[test]
    fn test_adjacent_wildcards_stay_inside_label() {
        let p = DomainPattern::parse("**.example.com").unwrap();
        assert!(p.matches("ab.example.com"));
        assert!(!p.matches("a.example.com"));
        assert!(!p.matches("a.b.example.com"));
    }

    #[test]
    fn test_many_wildcards_against_long_label_stays_fast() {
        let p = DomainPattern::parse("*a*a*a*a*a*a*a*b.example.com").unwrap();
        let host = format!("{}.example.com", "a".repeat(60));

        let started = std::time::Instant::now();
        assert!(!p.matches(&host));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        let host = format!("{}b.example.com", "a".repeat(60));
        assert!(p.matches(&host));
    }

    #[test]
    fn test_pattern_is_trimmed() {
        let p = DomainPattern::parse("  example.com ").unwrap();
        assert!(p.matches("example.com"));
        assert!(!p.matches("  example.com "));
        assert_eq!(p, DomainPattern::parse("example.com").unwrap());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(DomainPattern::parse("").is_err());
        assert!(DomainPattern::parse("a..b").is_err());
        assert!(DomainPattern::parse("https://example.com").is_err());
    }

    #[test]
    fn test_empty_policy_allows_everything() {
        let p = policy(&[]);
        assert!(p.allows_all());
        assert!(p.check(None).is_ok());
    }

    #[test]
    fn test_blank_entries_skipped() {
        let p = policy(&["example.com", " ", ""]);
        assert!(!p.allows_all());
        assert!(p.check(Some("https://example.com/page")).is_ok());
    }

    #[test]
    fn test_missing_origin() {
        let p = policy(&["example.com"]);
        assert_eq!(p.check(None), Err(OriginRejection::Missing));
        assert_eq!(p.check(Some("")), Err(OriginRejection::Missing));
    }

    #[test]
    fn test_unparsable_origin() {
        let p = policy(&["example.com"]);
        let err = p.check(Some("http://exa mple.com")).unwrap_err();
        assert_eq!(err, OriginRejection::Invalid);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_disallowed_origin() {
        let p = policy(&["*.example.com"]);
        let err = p.check(Some("https://evil.test")).unwrap_err();
        assert_eq!(
            err,
            OriginRejection::NotAllowed {
                host: "evil.test".into()
            }
        );
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_port_and_path_ignored() {
        let p = policy(&["*.example.com"]);
        assert!(p.check(Some("https://app.example.com:8443/a/b?c=d")).is_ok());
    }

    #[test]
    fn test_schemeless_value_not_allowed() {
        let p = policy(&["example.com"]);
        assert!(matches!(
            p.check(Some("example.com")),
            Err(OriginRejection::NotAllowed { .. })
        ));
    }
}
