//! # SHA-256 Fingerprints
//!
//! Report identity fingerprint: SHA-256 over the canonical JSON encoding,
//! rendered as 64 lowercase hex characters.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical::canonical_json_of;
use crate::errors::CryptoError;

/// Length of a hex-encoded fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// SHA-256 of raw bytes, lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Fingerprint of any serializable value through its canonical encoding.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<String, CryptoError> {
    let bytes = canonical_json_of(value)?;
    Ok(sha256_hex(&bytes))
}
