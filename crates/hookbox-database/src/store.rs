//! The storage contract of the hook outbox.
//!
//! `claim_batch` is the only operation that decides concurrency
//! correctness: it must select and lease due rows in one atomic step.
//! Every write on a claimed row goes through `finalize`, which compares the
//! caller's lock token with the row's before touching anything.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use hookbox_core::result::AppResult;
use hookbox_core::types::{HookId, LockToken};
use hookbox_entity::hook::{CreateHook, Hook, HookResolution, HookStatus};

/// Operator-initiated move of a pending hook to a terminal status.
///
/// Terminal hooks are never reopened; a redelivery is a fresh hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManualTransition {
    /// Close a pending hook without delivering it.
    Ignore,
    /// Stop a pending hook for investigation.
    Interrupt,
    /// Record that an operator delivered the hook by other means.
    MarkHandled,
}

impl ManualTransition {
    /// Status written by the transition.
    pub fn target_status(&self) -> HookStatus {
        match self {
            Self::Ignore => HookStatus::Ignored,
            Self::Interrupt => HookStatus::ManuallyInterrupted,
            Self::MarkHandled => HookStatus::ManuallyHandled,
        }
    }

    /// Check if the transition applies to a hook in `status`.
    pub fn allowed_from(&self, status: HookStatus) -> bool {
        status.is_claimable()
    }

    /// Statuses the transition may start from.
    pub fn source_statuses(&self) -> Vec<HookStatus> {
        HookStatus::ALL
            .into_iter()
            .filter(|status| self.allowed_from(*status))
            .collect()
    }
}

impl fmt::Display for ManualTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Interrupt => write!(f, "interrupt"),
            Self::MarkHandled => write!(f, "mark-handled"),
        }
    }
}

/// Durable storage for hooks plus the atomic claim query.
#[async_trait]
pub trait HookStore: Send + Sync + fmt::Debug + 'static {
    /// Insert a new hook in `QUEUED` with no lease and return the stored row.
    async fn append(&self, hook: &CreateHook) -> AppResult<Hook>;

    /// Atomically lease up to `limit` due hooks.
    ///
    /// A hook is due when its status is claimable, its execution timestamp
    /// is at or before `now`, and it holds no lease or a lease taken before
    /// `now - lease_duration`. Each returned hook carries a freshly minted
    /// lock token and `locked_at = now`. Rows leased by a concurrent caller
    /// are skipped, never waited on.
    async fn claim_batch(
        &self,
        now: DateTime<Utc>,
        lease_duration: Duration,
        limit: u32,
    ) -> AppResult<Vec<Hook>>;

    /// Apply `resolution` and clear the lease, only if `token` still owns the hook.
    ///
    /// Returns `false` when the token no longer matches (the lease expired
    /// and another worker reclaimed the hook); nothing is written then. The
    /// execution timestamp never moves backwards.
    async fn finalize(
        &self,
        id: HookId,
        token: LockToken,
        resolution: &HookResolution,
    ) -> AppResult<bool>;

    /// Find a hook by id.
    async fn find_by_id(&self, id: HookId) -> AppResult<Option<Hook>>;

    /// Apply an operator transition.
    ///
    /// Hooks under a live lease are left alone; `None` is returned when the
    /// hook does not exist or the transition does not apply.
    async fn transition(
        &self,
        id: HookId,
        transition: ManualTransition,
        now: DateTime<Utc>,
        lease_duration: Duration,
    ) -> AppResult<Option<Hook>>;

    /// Soft-delete terminal hooks last updated before `updated_before`.
    async fn purge(&self, updated_before: DateTime<Utc>) -> AppResult<u64>;

    /// Count hooks per status.
    async fn count_by_status(&self) -> AppResult<Vec<(HookStatus, i64)>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_sources() {
        assert_eq!(
            ManualTransition::Ignore.source_statuses(),
            vec![HookStatus::Queued, HookStatus::Failed]
        );
        assert_eq!(
            ManualTransition::Interrupt.source_statuses(),
            vec![HookStatus::Queued, HookStatus::Failed]
        );
        assert!(!ManualTransition::MarkHandled.allowed_from(HookStatus::CompletelyFailed));
        assert_eq!(
            ManualTransition::MarkHandled.target_status(),
            HookStatus::ManuallyHandled
        );
    }
}
