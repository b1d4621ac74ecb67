//! Hookbox worker — durable hook outbox engine
//!
//! Main entry point that wires the crates together and runs the poller
//! until a shutdown signal arrives or the configured runtime elapses.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use hookbox_core::config::AppConfig;
use hookbox_core::error::AppError;
use hookbox_database::{DatabasePool, HookStore, PgHookStore};
use hookbox_worker::{LockManager, Poller, RetryPolicy, TracingErrorSink};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Worker error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("HOOKBOX_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main worker run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Hookbox worker v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let database = DatabasePool::connect(&config.database).await?;
    hookbox_database::migration::run_migrations(database.pool()).await?;

    let store: Arc<dyn HookStore> = Arc::new(PgHookStore::new(database.pool().clone()));

    // ── Step 2: Handlers ─────────────────────────────────────────
    let dispatcher = Arc::new(hookbox_worker::build_dispatcher(&config.adapters)?);
    tracing::info!(
        "Dispatcher ready with {} handler(s)",
        dispatcher.registered_types().len()
    );

    if !config.worker.enabled {
        tracing::warn!("Worker disabled by configuration, exiting");
        database.close().await;
        return Ok(());
    }

    // ── Step 3: Poller ───────────────────────────────────────────
    let worker_id = config
        .worker
        .worker_id
        .clone()
        .unwrap_or_else(|| format!("worker-{}", std::process::id()));
    let locks = LockManager::new(
        Arc::clone(&store),
        config.worker.lease_duration(),
        config.worker.batch_size,
    )?;
    let poller = Poller::new(
        worker_id,
        locks,
        dispatcher,
        RetryPolicy::from_config(&config.retry),
        Arc::new(TracingErrorSink),
        &config.worker,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(async move { poller.run(shutdown_rx).await });

    // ── Step 4: Wait for shutdown ────────────────────────────────
    let max_runtime = config.worker.max_runtime();
    let runtime_elapsed = async {
        match max_runtime {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
        _ = runtime_elapsed => {
            tracing::info!("Maximum runtime reached, stopping");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = poller_handle.await {
        tracing::error!("Poller task failed: {}", e);
    }

    database.close().await;
    tracing::info!("Hookbox worker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
