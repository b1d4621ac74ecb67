//! In-memory [`HookStore`] guarded by a single async mutex.
//!
//! Holding the mutex for the whole of `claim_batch` gives the same
//! exclusive-claim guarantee the PostgreSQL store gets from
//! `FOR UPDATE SKIP LOCKED`. Used by tests and single-node deployments.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use hookbox_core::result::AppResult;
use hookbox_core::types::{HookId, LockToken};
use hookbox_entity::hook::{CreateHook, Hook, HookResolution, HookStatus};

use crate::store::{HookStore, ManualTransition};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    rows: BTreeMap<HookId, Hook>,
}

/// In-memory hook store.
#[derive(Debug, Clone, Default)]
pub struct MemoryHookStore {
    state: Arc<Mutex<State>>,
}

impl MemoryHookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every stored hook, ordered by id.
    pub async fn all(&self) -> Vec<Hook> {
        self.state.lock().await.rows.values().cloned().collect()
    }
}

#[async_trait]
impl HookStore for MemoryHookStore {
    async fn append(&self, hook: &CreateHook) -> AppResult<Hook> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let now = Utc::now();
        let row = Hook {
            id: HookId(state.next_id),
            receiver_entity_id: hook.receiver_entity_id,
            receiver_entity_kind: hook.receiver_entity_kind,
            event_type: hook.event_type.as_str().to_string(),
            custom_description: hook.custom_description.clone(),
            execution_timestamp: hook.execution_timestamp,
            lock_identifier: None,
            locked_at: None,
            status: HookStatus::Queued,
            failed_count: 0,
            params: hook.params.clone(),
            success_response: None,
            failed_response: None,
            created_at: now,
            updated_at: now,
        };
        state.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn claim_batch(
        &self,
        now: DateTime<Utc>,
        lease_duration: Duration,
        limit: u32,
    ) -> AppResult<Vec<Hook>> {
        let mut state = self.state.lock().await;

        let mut due: Vec<(DateTime<Utc>, HookId)> = state
            .rows
            .values()
            .filter(|hook| hook.is_claimable_at(now, lease_duration))
            .map(|hook| (hook.execution_timestamp, hook.id))
            .collect();
        due.sort();
        due.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(hook) = state.rows.get_mut(&id) {
                hook.lock_identifier = Some(LockToken::generate());
                hook.locked_at = Some(now);
                hook.updated_at = now;
                claimed.push(hook.clone());
            }
        }

        debug!(claimed = claimed.len(), "Claimed hooks from memory store");
        Ok(claimed)
    }

    async fn finalize(
        &self,
        id: HookId,
        token: LockToken,
        resolution: &HookResolution,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(hook) = state.rows.get_mut(&id) else {
            return Ok(false);
        };
        if hook.lock_identifier != Some(token) {
            return Ok(false);
        }

        hook.status = resolution.status;
        hook.failed_count = resolution.failed_count;
        if let Some(next) = resolution.execution_timestamp {
            hook.execution_timestamp = hook.execution_timestamp.max(next);
        }
        if let Some(response) = &resolution.success_response {
            hook.success_response = Some(response.clone());
        }
        if let Some(response) = &resolution.failed_response {
            hook.failed_response = Some(response.clone());
        }
        hook.lock_identifier = None;
        hook.locked_at = None;
        hook.updated_at = Utc::now();
        Ok(true)
    }

    async fn find_by_id(&self, id: HookId) -> AppResult<Option<Hook>> {
        Ok(self.state.lock().await.rows.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: HookId,
        transition: ManualTransition,
        now: DateTime<Utc>,
        lease_duration: Duration,
    ) -> AppResult<Option<Hook>> {
        let mut state = self.state.lock().await;
        let Some(hook) = state.rows.get_mut(&id) else {
            return Ok(None);
        };
        if !transition.allowed_from(hook.status) {
            return Ok(None);
        }
        if let Some(lease) = hook.lease() {
            if !lease.is_expired(now, lease_duration) {
                return Ok(None);
            }
        }

        hook.status = transition.target_status();
        hook.lock_identifier = None;
        hook.locked_at = None;
        hook.updated_at = now;
        Ok(Some(hook.clone()))
    }

    async fn purge(&self, updated_before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut purged = 0;
        for hook in state.rows.values_mut() {
            if hook.status.can_purge() && hook.updated_at < updated_before {
                hook.status = HookStatus::Deleted;
                hook.updated_at = now;
                purged += 1;
            }
        }
        Ok(purged)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(HookStatus, i64)>> {
        let state = self.state.lock().await;
        let counts = HookStatus::ALL
            .into_iter()
            .map(|status| {
                let count = state.rows.values().filter(|h| h.status == status).count();
                (status, count as i64)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        Ok(counts)
    }
}
