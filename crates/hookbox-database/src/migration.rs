//! Schema for the `hooks` table, embedded from `migrations/`.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use hookbox_core::result::{AppResult, ResultExt};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply pending migrations and return how many the binary ships.
pub async fn run_migrations(pool: &PgPool) -> AppResult<usize> {
    let known = MIGRATOR.iter().count();
    MIGRATOR
        .run(pool)
        .await
        .or_database("Failed to migrate the hooks schema")?;

    info!(migrations = known, "Hooks schema is up to date");
    Ok(known)
}
