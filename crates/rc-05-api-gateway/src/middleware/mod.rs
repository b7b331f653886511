//! Middleware stack for the report gateway.
//!
//! - `origin`: allow-list on the report route
//! - `cors`: tower-http CORS built from configuration

pub mod cors;
pub mod origin;

pub use cors::create_cors_layer;
pub use origin::enforce_origin;
