//! # Stored Report Row
//!
//! ## Key Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `report:row:<uuid>` | `StoredReport` JSON |
//! | `report:hash:<hash>` | row id (unique index) |
//! | `meta:schema_version` | decimal schema version |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

pub(crate) const SCHEMA_KEY: &[u8] = b"meta:schema_version";
pub(crate) const ROW_PREFIX: &str = "report:row:";
pub(crate) const HASH_PREFIX: &str = "report:hash:";

pub(crate) fn row_key(id: &Uuid) -> Vec<u8> {
    format!("{}{}", ROW_PREFIX, id).into_bytes()
}

pub(crate) fn hash_key(hash: &str) -> Vec<u8> {
    format!("{}{}", HASH_PREFIX, hash).into_bytes()
}

/// A persisted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    /// Time-ordered unique row id (UUIDv7).
    pub id: Uuid,
    /// Report type tag.
    pub report_type: String,
    /// Full report JSON as submitted.
    pub report: serde_json::Value,
    /// Submitter `User-Agent`.
    pub user_agent: String,
    /// Canonical fingerprint, unique across rows.
    pub hash: String,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_keys_sort_by_creation() {
        let first = Uuid::now_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = Uuid::now_v7();
        assert!(row_key(&first) < row_key(&second));
    }

    #[test]
    fn test_hash_key_layout() {
        assert_eq!(hash_key("abc"), b"report:hash:abc".to_vec());
    }
}
