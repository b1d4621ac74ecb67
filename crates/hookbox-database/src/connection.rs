//! Pool for the `hooks` table.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use hookbox_core::config::DatabaseConfig;
use hookbox_core::result::{AppResult, ResultExt};

/// PostgreSQL pool shared by the hook store and operator commands.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool and check that the server answers.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let url = config.redacted_url();
        debug!(
            url = %url,
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Opening hook store pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect(&config.url)
            .await
            .or_database(format!("Failed to connect to hook store at {url}"))?;

        let server_version: String = sqlx::query_scalar("SHOW server_version")
            .fetch_one(&pool)
            .await
            .or_database("Hook store did not answer")?;

        info!(url = %url, server_version = %server_version, "Hook store pool ready");
        Ok(Self { pool })
    }

    /// Borrow the sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Take the sqlx pool.
    pub fn into_pool(self) -> PgPool {
        self.pool
    }

    /// Close every connection; in-flight queries finish first.
    pub async fn close(&self) {
        let open = self.pool.size();
        self.pool.close().await;
        info!(connections = open, "Hook store pool closed");
    }
}
