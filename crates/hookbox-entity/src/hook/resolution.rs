//! The write applied when a claimed hook is released.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::HookStatus;

/// New state for a claimed hook, written together with clearing its lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookResolution {
    /// Status after release.
    pub status: HookStatus,
    /// Failure count after release.
    pub failed_count: i32,
    /// New execution timestamp for a rescheduled hook.
    pub execution_timestamp: Option<DateTime<Utc>>,
    /// Outcome recorded on success or ignore.
    pub success_response: Option<serde_json::Value>,
    /// Outcome recorded on failure.
    pub failed_response: Option<serde_json::Value>,
}

impl HookResolution {
    /// Delivered successfully.
    pub fn completed(failed_count: i32, response: serde_json::Value) -> Self {
        Self {
            status: HookStatus::Completed,
            failed_count,
            execution_timestamp: None,
            success_response: Some(response),
            failed_response: None,
        }
    }

    /// Closed without delivery.
    pub fn ignored(failed_count: i32, reason: serde_json::Value) -> Self {
        Self {
            status: HookStatus::Ignored,
            failed_count,
            execution_timestamp: None,
            success_response: Some(reason),
            failed_response: None,
        }
    }

    /// Back to the queue, not before `next_attempt_at`.
    pub fn retry(
        failed_count: i32,
        next_attempt_at: DateTime<Utc>,
        response: serde_json::Value,
    ) -> Self {
        Self {
            status: HookStatus::Queued,
            failed_count,
            execution_timestamp: Some(next_attempt_at),
            success_response: None,
            failed_response: Some(response),
        }
    }

    /// Terminal failure.
    pub fn completely_failed(failed_count: i32, response: serde_json::Value) -> Self {
        Self {
            status: HookStatus::CompletelyFailed,
            failed_count,
            execution_timestamp: None,
            success_response: None,
            failed_response: Some(response),
        }
    }
}
