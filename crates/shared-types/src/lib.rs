//! # Shared Types Crate
//!
//! Report model and envelope shared across the collector subsystems.
//!
//! ## Design Principles
//!
//! - **Closed Report Set**: Every supported report schema is a variant of
//!   [`Report`]. The core only relies on three capabilities: a type tag, a
//!   JSON serialization and the identity subset used for fingerprinting.
//! - **Explicit Registry**: Decoding is dispatched by type tag through a
//!   [`ReportRegistry`] built and validated once at startup.
//! - **Envelope Integrity**: [`ReportEnvelope`] is the only unit that enters
//!   the buffering queue; its wire format is stable across processes.

pub mod csp;
pub mod envelope;
pub mod errors;
pub mod registry;
pub mod report;

pub use csp::{CspReport, CspReportBody, CspReportHashData, CSP_REPORT_TYPE};
pub use envelope::ReportEnvelope;
pub use errors::ReportError;
pub use registry::{ReportDecoder, ReportRegistry};
pub use report::Report;
