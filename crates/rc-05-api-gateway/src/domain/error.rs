//! Gateway error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while building or running the gateway.
///
/// Request-level failures never surface here; they become HTTP statuses.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration failed validation.
    #[error("Invalid gateway configuration: {0}")]
    Config(String),

    /// An allowed-domain entry is not a valid host pattern.
    #[error("Invalid domain pattern '{pattern}': {reason}")]
    InvalidDomainPattern { pattern: String, reason: &'static str },

    /// The listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}
