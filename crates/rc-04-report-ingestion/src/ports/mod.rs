//! Ports Layer
//!
//! - Driving port (inbound): `ReportIntake`, called by the HTTP gateway
//! - Driven ports are the collaborator traits `ReportQueue`, `ReportStore`
//!   and `ReportCache`, owned by their crates

pub mod inbound;

pub use inbound::ReportIntake;
