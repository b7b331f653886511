//! Crypto error types.

use thiserror::Error;

/// Fingerprinting errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Input could not be represented as JSON.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::Serialization(err.to_string())
    }
}
