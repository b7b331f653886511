//! # Shared Crypto - Report Fingerprinting
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `canonical` | Sorted-key JSON | Order-independent encoding |
//! | `hashing` | SHA-256 | Report deduplication fingerprint |
//!
//! ## Properties
//!
//! - **Deterministic**: same identity fields give the same digest across
//!   processes and runs.
//! - **Order-invariant**: object keys are sorted at every depth; arrays keep
//!   their order.
//! - **Compatible**: string escaping matches the fingerprints already held by
//!   existing report stores (`<`, `>`, `&`, U+2028, U+2029 are escaped).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod errors;
pub mod hashing;

// Re-exports
pub use canonical::{canonical_json, canonical_json_of};
pub use errors::CryptoError;
pub use hashing::{canonical_hash, sha256_hex, FINGERPRINT_HEX_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
