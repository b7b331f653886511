//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::domain::error::GatewayError;
use crate::domain::origin::DomainPattern;

/// Default request body cap (64 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Host patterns allowed to submit reports. Empty allows every origin.
    pub allowed_domains: Vec<String>,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allowed_domains: Vec::new(),
            cors: CorsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.port == 0 {
            return Err(GatewayError::Config("port cannot be 0".into()));
        }

        if self.max_body_bytes == 0 {
            return Err(GatewayError::Config("max_body_bytes cannot be 0".into()));
        }

        for domain in &self.allowed_domains {
            DomainPattern::parse(domain)?;
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS headers
    pub enabled: bool,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed request headers
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_methods: vec!["GET".into(), "POST".into(), "OPTIONS".into()],
            allowed_headers: vec!["Content-Type".into()],
            max_age: 86400,
        }
    }
}
