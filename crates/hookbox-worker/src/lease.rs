//! Lease protocol on top of a [`HookStore`].
//!
//! A claim hands each hook a fresh [`LockToken`]. The token is the only
//! proof of ownership: releasing a hook whose lease expired and was
//! reclaimed by another worker is a no-op, reported as
//! [`ReleaseOutcome::Lost`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing;

use hookbox_core::error::AppError;
use hookbox_core::result::AppResult;
use hookbox_core::types::LockToken;
use hookbox_database::HookStore;
use hookbox_entity::hook::{Hook, HookResolution};

/// A hook together with the token that leases it.
#[derive(Debug, Clone)]
pub struct LeasedHook {
    /// The claimed row as returned by the claim.
    pub hook: Hook,
    /// Token minted for this claim.
    pub token: LockToken,
}

/// Result of releasing a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The resolution was written and the lease cleared.
    Released,
    /// The lease no longer belonged to us; nothing was written.
    Lost,
}

/// Claims and releases hooks.
#[derive(Debug, Clone)]
pub struct LockManager {
    store: Arc<dyn HookStore>,
    lease_duration: chrono::Duration,
    batch_size: u32,
}

impl LockManager {
    /// Create a lock manager.
    pub fn new(
        store: Arc<dyn HookStore>,
        lease_duration: Duration,
        batch_size: u32,
    ) -> AppResult<Self> {
        if batch_size == 0 {
            return Err(AppError::validation("batch_size must be at least 1"));
        }
        if lease_duration.is_zero() {
            return Err(AppError::validation("lease duration must be positive"));
        }
        let lease_duration = chrono::Duration::from_std(lease_duration)
            .map_err(|e| AppError::validation(format!("lease duration out of range: {e}")))?;

        Ok(Self {
            store,
            lease_duration,
            batch_size,
        })
    }

    /// Lease duration in use.
    pub fn lease_duration(&self) -> chrono::Duration {
        self.lease_duration
    }

    /// Maximum number of hooks per claim.
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn HookStore> {
        &self.store
    }

    /// Lease up to `batch_size` due hooks at `now`.
    pub async fn acquire(&self, now: DateTime<Utc>) -> AppResult<Vec<LeasedHook>> {
        let hooks = self
            .store
            .claim_batch(now, self.lease_duration, self.batch_size)
            .await?;

        let mut leased = Vec::with_capacity(hooks.len());
        for hook in hooks {
            match hook.lock_identifier {
                Some(token) => leased.push(LeasedHook { hook, token }),
                None => {
                    return Err(AppError::internal(format!(
                        "claimed hook {} came back without a lock token",
                        hook.id
                    )));
                }
            }
        }

        if !leased.is_empty() {
            tracing::debug!("Leased {} hook(s)", leased.len());
        }
        Ok(leased)
    }

    /// Write `resolution` and clear the lease if we still own it.
    pub async fn release(
        &self,
        leased: &LeasedHook,
        resolution: &HookResolution,
    ) -> AppResult<ReleaseOutcome> {
        let written = self
            .store
            .finalize(leased.hook.id, leased.token, resolution)
            .await?;

        if written {
            Ok(ReleaseOutcome::Released)
        } else {
            tracing::warn!(
                "Lease on hook {} was lost before release (token {}), result discarded",
                leased.hook.id,
                leased.token
            );
            Ok(ReleaseOutcome::Lost)
        }
    }
}
