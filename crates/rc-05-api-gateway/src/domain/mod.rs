//! Gateway domain: configuration, errors and the origin allow-list.

pub mod config;
pub mod error;
pub mod origin;

pub use config::{CorsConfig, GatewayConfig};
pub use error::GatewayError;
pub use origin::{DomainPattern, OriginPolicy, OriginRejection};
