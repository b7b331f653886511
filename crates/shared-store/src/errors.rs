//! Key-value store errors.

use thiserror::Error;

/// Errors raised by [`crate::KeyValueStore`] adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },

    /// Driver name not recognised.
    #[error("Unknown store driver {name:?} (supported: {supported})")]
    UnknownDriver { name: String, supported: String },

    /// Driver recognised but not compiled into this build.
    #[error("Store driver {0:?} is not enabled in this build")]
    DriverUnavailable(String),
}

impl From<std::io::Error> for KVStoreError {
    fn from(err: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}
