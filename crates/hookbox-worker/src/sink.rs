//! Default [`ErrorSink`] that forwards reports to `tracing`.

use tracing;

use hookbox_core::traits::{ErrorReport, ErrorSink, Severity};

/// Emits every report as a log event at a level matching its severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn record(&self, report: &ErrorReport) {
        match report.severity {
            Severity::Warning => tracing::warn!(
                hook_id = report.hook_id,
                event_type = %report.event_type,
                failed_count = report.failed_count,
                "{}",
                report.message
            ),
            Severity::Error | Severity::Critical => tracing::error!(
                hook_id = report.hook_id,
                event_type = %report.event_type,
                failed_count = report.failed_count,
                severity = %report.severity,
                "{}",
                report.message
            ),
        }
    }
}
