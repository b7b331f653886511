//! # RC-05 API Gateway
//!
//! HTTP intake for browser security reports.
//!
//! ## Routes
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /healthz` | 200 |
//! | `GET /metrics` | Prometheus text format |
//! | `POST /reports/:type` | 204 accepted (including duplicates), 400 malformed, 403 origin refused, 404 unknown type, 413 too large, 500 intake failure |
//!
//! ## Middleware
//!
//! ```text
//! Trace → CORS → Body limit → [report route only] Origin allow-list → handler
//! ```
//!
//! The allow-list reads `Origin`, falling back to `Referer`, and matches the
//! host against patterns such as `*.example.com`.
//!
//! ## Usage
//!
//! ```ignore
//! use rc_05_api_gateway::{ApiGatewayService, GatewayConfig};
//!
//! let gateway = ApiGatewayService::new(config, registry, intake)?;
//! gateway.serve(shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::{
    CorsConfig, DomainPattern, GatewayConfig, GatewayError, OriginPolicy, OriginRejection,
};
pub use router::{build_router, AppState};
pub use service::ApiGatewayService;
