//! Inbound Ports (Driving Ports)

use async_trait::async_trait;
use shared_types::Report;

use crate::domain::IntakeOutcome;
use crate::error::IntakeError;

/// Report intake API.
#[async_trait]
pub trait ReportIntake: Send + Sync {
    /// Accept one decoded report submitted with `user_agent`.
    ///
    /// Duplicates are successes; only backend failures are errors.
    async fn save_report(
        &self,
        report_type: &str,
        report: Report,
        user_agent: &str,
    ) -> Result<IntakeOutcome, IntakeError>;
}
