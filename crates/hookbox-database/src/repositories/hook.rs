//! Hook repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, PgPool};

use hookbox_core::result::{AppResult, ResultExt};
use hookbox_core::types::{HookId, LockToken};
use hookbox_entity::hook::{CreateHook, Hook, HookResolution, HookStatus};

use crate::store::{HookStore, ManualTransition};

/// PostgreSQL-backed [`HookStore`].
#[derive(Debug, Clone)]
pub struct PgHookStore {
    pool: PgPool,
}

impl PgHookStore {
    /// Create a new hook store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Insert a hook using any executor, typically the caller's open transaction.
///
/// Lets business logic record the hook atomically with the state change it
/// reports on.
pub async fn append_in<'e, E>(executor: E, hook: &CreateHook) -> AppResult<Hook>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Hook>(
        "INSERT INTO hooks (receiver_entity_id, receiver_entity_kind, event_type, \
         custom_description, execution_timestamp, status, failed_count, params) \
         VALUES ($1, $2, $3, $4, $5, $6, 0, $7) RETURNING *",
    )
    .bind(hook.receiver_entity_id)
    .bind(hook.receiver_entity_kind)
    .bind(hook.event_type.as_str())
    .bind(&hook.custom_description)
    .bind(hook.execution_timestamp)
    .bind(HookStatus::Queued)
    .bind(&hook.params)
    .fetch_one(executor)
    .await
    .or_database("Failed to append hook")
}

fn status_codes(statuses: &[HookStatus]) -> Vec<i16> {
    statuses.iter().map(HookStatus::code).collect()
}

#[async_trait]
impl HookStore for PgHookStore {
    async fn append(&self, hook: &CreateHook) -> AppResult<Hook> {
        append_in(&self.pool, hook).await
    }

    async fn claim_batch(
        &self,
        now: DateTime<Utc>,
        lease_duration: Duration,
        limit: u32,
    ) -> AppResult<Vec<Hook>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Hook>(
            "UPDATE hooks AS h \
             SET lock_identifier = gen_random_uuid(), locked_at = $1, updated_at = $1 \
             FROM ( \
                SELECT id FROM hooks \
                WHERE status = ANY($2) \
                AND execution_timestamp <= $1 \
                AND (lock_identifier IS NULL OR locked_at < $3) \
                ORDER BY execution_timestamp ASC, id ASC \
                LIMIT $4 \
                FOR UPDATE SKIP LOCKED \
             ) AS due \
             WHERE h.id = due.id \
             RETURNING h.*",
        )
        .bind(now)
        .bind(status_codes(&HookStatus::CLAIMABLE))
        .bind(now - lease_duration)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .or_database("Failed to claim hooks")
    }

    async fn finalize(
        &self,
        id: HookId,
        token: LockToken,
        resolution: &HookResolution,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE hooks SET status = $3, failed_count = $4, \
             execution_timestamp = GREATEST(execution_timestamp, COALESCE($5, execution_timestamp)), \
             success_response = COALESCE($6, success_response), \
             failed_response = COALESCE($7, failed_response), \
             lock_identifier = NULL, locked_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND lock_identifier = $2",
        )
        .bind(id)
        .bind(token)
        .bind(resolution.status)
        .bind(resolution.failed_count)
        .bind(resolution.execution_timestamp)
        .bind(&resolution.success_response)
        .bind(&resolution.failed_response)
        .execute(&self.pool)
        .await
        .or_database("Failed to finalize hook")?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: HookId) -> AppResult<Option<Hook>> {
        sqlx::query_as::<_, Hook>("SELECT * FROM hooks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_database("Failed to find hook")
    }

    async fn transition(
        &self,
        id: HookId,
        transition: ManualTransition,
        now: DateTime<Utc>,
        lease_duration: Duration,
    ) -> AppResult<Option<Hook>> {
        sqlx::query_as::<_, Hook>(
            "UPDATE hooks SET status = $2, \
             lock_identifier = NULL, locked_at = NULL, updated_at = $3 \
             WHERE id = $1 AND status = ANY($4) \
             AND (lock_identifier IS NULL OR locked_at < $5) \
             RETURNING *",
        )
        .bind(id)
        .bind(transition.target_status())
        .bind(now)
        .bind(status_codes(&transition.source_statuses()))
        .bind(now - lease_duration)
        .fetch_optional(&self.pool)
        .await
        .or_database(format!("Failed to apply '{transition}' to hook {id}"))
    }

    async fn purge(&self, updated_before: DateTime<Utc>) -> AppResult<u64> {
        let purgeable: Vec<HookStatus> = HookStatus::ALL
            .into_iter()
            .filter(HookStatus::can_purge)
            .collect();

        let result = sqlx::query(
            "UPDATE hooks SET status = $1, updated_at = NOW() \
             WHERE status = ANY($2) AND updated_at < $3",
        )
        .bind(HookStatus::Deleted)
        .bind(status_codes(&purgeable))
        .bind(updated_before)
        .execute(&self.pool)
        .await
        .or_database("Failed to purge hooks")?;

        Ok(result.rows_affected())
    }

    async fn count_by_status(&self) -> AppResult<Vec<(HookStatus, i64)>> {
        sqlx::query_as::<_, (HookStatus, i64)>(
            "SELECT status, COUNT(*) FROM hooks GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .or_database("Failed to count hooks")
    }
}
