//! CORS middleware.
//!
//! Wrapper around tower-http CORS with gateway configuration. Origins are
//! not restricted here; the allow-list middleware decides which pages may
//! submit reports.

use crate::domain::config::CorsConfig;
use axum::http::{HeaderName, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Create CORS layer from gateway config
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        // No CORS headers at all
        return CorsLayer::new();
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    let mut cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .max_age(Duration::from_secs(config.max_age));

    if config.allowed_headers.iter().any(|h| h == "*") {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}
