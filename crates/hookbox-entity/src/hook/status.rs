//! Hook status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use hookbox_core::AppError;

/// Status of a hook row, stored as a `SMALLINT`.
///
/// A claimed hook keeps its status; ownership is expressed by the lease
/// columns only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookStatus {
    /// Waiting for its execution timestamp and a worker.
    Queued = 1,
    /// Delivered successfully.
    Completed = 2,
    /// Last attempt failed and the hook is still eligible for retry.
    Failed = 3,
    /// Retries exhausted or failure was permanent.
    CompletelyFailed = 4,
    /// Nothing to deliver; closed without an external call.
    Ignored = 5,
    /// Stopped by an operator before delivery.
    ManuallyInterrupted = 6,
    /// Resolved by an operator outside the engine.
    ManuallyHandled = 7,
    /// Soft-deleted by an administrative purge.
    Deleted = 8,
}

impl HookStatus {
    /// Every status, in code order.
    pub const ALL: [HookStatus; 8] = [
        Self::Queued,
        Self::Completed,
        Self::Failed,
        Self::CompletelyFailed,
        Self::Ignored,
        Self::ManuallyInterrupted,
        Self::ManuallyHandled,
        Self::Deleted,
    ];

    /// Statuses a poller may claim.
    pub const CLAIMABLE: [HookStatus; 2] = [Self::Queued, Self::Failed];

    /// Check if no further claim or automatic transition can happen.
    pub fn is_terminal(&self) -> bool {
        !self.is_claimable()
    }

    /// Check if a poller may claim a hook in this status.
    pub fn is_claimable(&self) -> bool {
        matches!(self, Self::Queued | Self::Failed)
    }

    /// Check if an administrative purge may soft-delete the hook.
    pub fn can_purge(&self) -> bool {
        self.is_terminal() && *self != Self::Deleted
    }

    /// The stored `SMALLINT` value.
    pub fn code(&self) -> i16 {
        *self as i16
    }

    /// Look up a status by its stored value.
    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::CompletelyFailed => "COMPLETELY_FAILED",
            Self::Ignored => "IGNORED",
            Self::ManuallyInterrupted => "MANUALLY_INTERRUPTED",
            Self::ManuallyHandled => "MANUALLY_HANDLED",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HookStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| AppError::validation(format!("Invalid hook status: '{s}'")))
    }
}
