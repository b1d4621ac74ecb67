//! Application configuration schemas.
//!
//! All configuration structs are deserialized from a TOML file via the
//! `config` crate, overlaid with `HOOKBOX__`-prefixed environment variables.
//! The result is built once at startup and shared immutably.

pub mod adapters;
pub mod database;
pub mod logging;
pub mod retry;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::adapters::{AdaptersConfig, ApiAdapterConfig, WebhookAdapterConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::retry::{BackoffStrategy, RetryConfig};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Poller worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Retry and backoff settings.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Delivery adapter settings.
    #[serde(default)]
    pub adapters: AdaptersConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional; environment variables such as
    /// `HOOKBOX__DATABASE__URL` override or supply any value.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("HOOKBOX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.validate()?;
        Ok(app)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        let database = &self.database;
        let worker = &self.worker;
        let retry = &self.retry;

        if database.max_connections == 0 || database.min_connections > database.max_connections {
            return Err(AppError::configuration(format!(
                "database pool bounds are invalid: min_connections={}, max_connections={}",
                database.min_connections, database.max_connections
            )));
        }

        if worker.poll_interval_seconds == 0 {
            return Err(AppError::configuration(
                "worker.poll_interval_seconds must be at least 1",
            ));
        }
        if worker.delivery_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "worker.delivery_timeout_seconds must be at least 1",
            ));
        }
        if worker.batch_size == 0 {
            return Err(AppError::configuration("worker.batch_size must be at least 1"));
        }
        if worker.concurrency == 0 {
            return Err(AppError::configuration("worker.concurrency must be at least 1"));
        }
        if worker.lease_duration() <= worker.tick_budget() {
            return Err(AppError::configuration(format!(
                "worker.lease_duration_seconds ({}) must exceed {}s: ceil(batch_size {} / concurrency {}) x delivery_timeout_seconds {}",
                worker.lease_duration_seconds,
                worker.tick_budget().as_secs(),
                worker.batch_size,
                worker.concurrency,
                worker.delivery_timeout_seconds
            )));
        }
        if retry.retry_limit == 0 {
            return Err(AppError::configuration("retry.retry_limit must be at least 1"));
        }
        if retry.base_delay_seconds == 0 {
            return Err(AppError::configuration(
                "retry.base_delay_seconds must be at least 1",
            ));
        }
        if retry.max_delay_seconds < retry.base_delay_seconds {
            return Err(AppError::configuration(
                "retry.max_delay_seconds must not be smaller than retry.base_delay_seconds",
            ));
        }
        if !(0.0..=1.0).contains(&retry.jitter_factor) {
            return Err(AppError::configuration(format!(
                "retry.jitter_factor must be within [0, 1], got {}",
                retry.jitter_factor
            )));
        }

        tracing::debug!(
            batch_size = worker.batch_size,
            lease_duration_seconds = worker.lease_duration_seconds,
            retry_limit = retry.retry_limit,
            strategy = %retry.strategy,
            "Configuration validated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "postgres://hookbox@localhost/hookbox".to_string(),
                max_connections: 5,
                min_connections: 1,
                connect_timeout_seconds: 10,
                idle_timeout_seconds: 300,
            },
            logging: LoggingConfig::default(),
            worker: WorkerConfig::default(),
            retry: RetryConfig::default(),
            adapters: AdaptersConfig::default(),
        }
    }

    #[test]
    fn test_defaults_match_observed_constants() {
        let config = base_config();
        assert_eq!(config.worker.batch_size, 10);
        assert_eq!(config.retry.retry_limit, 3);
        assert_eq!(config.retry.strategy, BackoffStrategy::Exponential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lease_must_exceed_delivery_timeout() {
        let mut config = base_config();
        config.worker.lease_duration_seconds = 60;
        config.worker.delivery_timeout_seconds = 60;
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.message.contains("lease_duration_seconds"));
    }

    #[test]
    fn test_lease_must_cover_queued_deliveries() {
        let mut config = base_config();
        config.worker.batch_size = 3;
        config.worker.concurrency = 1;
        config.worker.delivery_timeout_seconds = 1;
        config.worker.lease_duration_seconds = 2;
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("lease_duration_seconds"));

        config.worker.lease_duration_seconds = 3;
        assert!(config.validate().is_err());

        config.worker.lease_duration_seconds = 4;
        assert!(config.validate().is_ok());

        // Three rounds of four at 60s each.
        config.worker.batch_size = 10;
        config.worker.concurrency = 4;
        config.worker.delivery_timeout_seconds = 60;
        config.worker.lease_duration_seconds = 180;
        assert!(config.validate().is_err());
        config.worker.lease_duration_seconds = 181;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tick_budget_rounds_up() {
        let worker = WorkerConfig {
            batch_size: 5,
            concurrency: 2,
            delivery_timeout_seconds: 7,
            ..WorkerConfig::default()
        };
        assert_eq!(worker.tick_budget(), std::time::Duration::from_secs(21));
    }

    #[test]
    fn test_rejects_zero_batch_and_retry_limit() {
        let mut config = base_config();
        config.worker.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.retry.retry_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_pool_bounds() {
        let mut config = base_config();
        config.database.min_connections = 10;
        config.database.max_connections = 5;
        assert!(config.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_rejects_jitter_out_of_range() {
        let mut config = base_config();
        config.retry.jitter_factor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_minimal_toml() {
        let raw = r#"
            [database]
            url = "postgres://localhost/hooks"

            [retry]
            strategy = "linear"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.retry.strategy, BackoffStrategy::Linear);
        assert_eq!(config.worker.lease_duration_seconds, 300);
        assert_eq!(config.logging.format, "json");
        assert!(config.adapters.mail.api_key.is_none());
    }

    #[test]
    fn test_max_runtime_converts_minutes() {
        let worker = WorkerConfig {
            max_runtime_minutes: Some(15),
            ..WorkerConfig::default()
        };
        assert_eq!(
            worker.max_runtime(),
            Some(std::time::Duration::from_secs(900))
        );
    }
}
