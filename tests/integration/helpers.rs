//! Shared test helpers for integration tests.

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};

use hookbox_core::config::DatabaseConfig;
use hookbox_core::types::ReceiverId;
use hookbox_database::{DatabasePool, PgHookStore};
use hookbox_entity::hook::{CreateHook, EventType, ReceiverKind};

/// Tests share one database; each holds this lock while it runs.
static DATABASE_LOCK: Mutex<()> = Mutex::const_new(());

/// Test database context
pub struct TestDb {
    /// Database pool for direct queries
    pub pool: PgPool,
    /// Store under test
    pub store: PgHookStore,
    _guard: MutexGuard<'static, ()>,
}

impl TestDb {
    /// Connect, migrate, and empty the `hooks` table
    pub async fn new() -> Self {
        let guard = DATABASE_LOCK.lock().await;

        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a disposable test database");
        let config = DatabaseConfig {
            url,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 60,
        };

        let database = DatabasePool::connect(&config)
            .await
            .expect("Failed to connect to test database");
        hookbox_database::migration::run_migrations(database.pool())
            .await
            .expect("Failed to run migrations");

        let pool = database.into_pool();
        sqlx::query("TRUNCATE hooks RESTART IDENTITY")
            .execute(&pool)
            .await
            .expect("Failed to clean hooks table");

        Self {
            store: PgHookStore::new(pool.clone()),
            pool,
            _guard: guard,
        }
    }
}

/// Current time at the database's microsecond precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A push hook due at `at`
pub fn push_hook(at: DateTime<Utc>) -> CreateHook {
    CreateHook {
        receiver_entity_id: ReceiverId(1001),
        receiver_entity_kind: ReceiverKind::User,
        event_type: EventType::PushNotification,
        custom_description: Some("integration".to_string()),
        execution_timestamp: at,
        params: json!({ "message": "hello", "device_tokens": ["abc"] }),
    }
}
