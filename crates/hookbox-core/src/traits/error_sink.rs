//! Sink for delivery failures that operators need to see.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgently an operator should look at a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth knowing, no action needed.
    Warning,
    /// A hook ended in a failure state.
    Error,
    /// The deployment is misconfigured.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single failure report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Hook the failure belongs to.
    pub hook_id: i64,
    /// Raw event type of the hook.
    pub event_type: String,
    /// Failure count at the time of the report.
    pub failed_count: i32,
    /// Human-readable description.
    pub message: String,
    /// Report severity.
    pub severity: Severity,
}

/// Receives failure details for operational visibility.
///
/// Called on permanent failures, retry exhaustion, and event types with no
/// registered handler. Implementations must not fail: a sink that cannot
/// deliver its report swallows the problem itself.
pub trait ErrorSink: Send + Sync + fmt::Debug + 'static {
    /// Record one report.
    fn record(&self, report: &ErrorReport);
}
