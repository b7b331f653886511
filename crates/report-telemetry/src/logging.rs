//! Structured log helpers.
//!
//! Report events carry the same field names everywhere so log queries can
//! join gateway, intake and flush lines on `component` and `report_type`.

/// Log a report-related event with standard fields.
///
/// ```rust,ignore
/// log_report_event!(info, "gateway", "Report accepted", "csp", outcome = %outcome);
/// log_report_event!(warn, "flusher", "Report dropped", "csp", hash = %hash);
/// ```
#[macro_export]
macro_rules! log_report_event {
    ($level:ident, $component:expr, $msg:expr, $report_type:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            report_type = %$report_type,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macro_expands_without_subscriber() {
        let hash = "ab".repeat(32);
        crate::log_report_event!(info, "test", "Report accepted", "csp", outcome = "stored");
        crate::log_report_event!(warn, "test", "Report rejected", "csp", hash = %hash);
        crate::log_report_event!(debug, "test", "Report seen", "csp");
    }
}
