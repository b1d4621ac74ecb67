//! Hook inspection and operator commands.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use hookbox_core::error::AppError;
use hookbox_core::types::{HookId, ReceiverId};
use hookbox_database::{HookStore, ManualTransition, PgHookStore};
use hookbox_entity::hook::{EventType, ReceiverKind};
use hookbox_worker::{HookCreator, NewHook};

/// Arguments for hook commands
#[derive(Debug, Args)]
pub struct HooksArgs {
    /// Hook subcommand
    #[command(subcommand)]
    pub command: HooksCommand,
}

/// Hook subcommands
#[derive(Debug, Subcommand)]
pub enum HooksCommand {
    /// Show hook counts per status
    Status,
    /// Show a single hook
    Show {
        /// Hook ID
        id: HookId,
    },
    /// Close a pending hook without delivering it
    Ignore {
        /// Hook ID
        id: HookId,
    },
    /// Stop a pending hook for investigation
    Interrupt {
        /// Hook ID
        id: HookId,
    },
    /// Record that a pending hook was delivered by other means
    Handled {
        /// Hook ID
        id: HookId,
    },
    /// Soft-delete terminal hooks older than the given age
    Purge {
        /// Minimum age in days since the last update
        #[arg(long, default_value_t = 30)]
        older_than_days: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Append a hook by hand
    Enqueue {
        /// Receiver entity ID
        #[arg(long)]
        receiver_id: ReceiverId,
        /// Receiver entity kind (user, video, admin, channel)
        #[arg(long)]
        receiver_kind: ReceiverKind,
        /// Event type, e.g. push.notification
        #[arg(long)]
        event_type: EventType,
        /// JSON params object
        #[arg(long, default_value = "{}")]
        params: String,
        /// Delay before the hook becomes due, in seconds
        #[arg(long)]
        delay_seconds: Option<u64>,
        /// Audit note
        #[arg(long)]
        description: Option<String>,
    },
}

/// Status count row for table output
#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    /// Status name
    status: String,
    /// Status code
    code: i16,
    /// Number of hooks
    count: i64,
}

/// Execute hook commands
pub async fn execute(
    args: &HooksArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let pool = super::create_db_pool(&config).await?;
    let store = Arc::new(PgHookStore::new(pool.clone()));
    let lease_duration = chrono::Duration::from_std(config.worker.lease_duration())
        .map_err(|e| AppError::configuration(format!("Invalid lease duration: {}", e)))?;

    match &args.command {
        HooksCommand::Status => {
            let rows: Vec<StatusRow> = store
                .count_by_status()
                .await?
                .into_iter()
                .map(|(status, count)| StatusRow {
                    status: status.to_string(),
                    code: status.code(),
                    count,
                })
                .collect();
            output::print_list(&rows, format);
        }
        HooksCommand::Show { id } => {
            let hook = store
                .find_by_id(*id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Hook {} not found", id)))?;
            output::print_item(&hook, format);
        }
        HooksCommand::Ignore { id } => {
            apply(store.as_ref(), *id, ManualTransition::Ignore, lease_duration).await?;
        }
        HooksCommand::Interrupt { id } => {
            apply(store.as_ref(), *id, ManualTransition::Interrupt, lease_duration).await?;
        }
        HooksCommand::Handled { id } => {
            apply(store.as_ref(), *id, ManualTransition::MarkHandled, lease_duration).await?;
        }
        HooksCommand::Purge {
            older_than_days,
            force,
        } => {
            if *older_than_days < 0 {
                return Err(AppError::validation("--older-than-days must not be negative"));
            }
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Mark terminal hooks untouched for {} day(s) as DELETED?",
                        older_than_days
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let cutoff = Utc::now() - chrono::Duration::days(*older_than_days);
            let purged = store.purge(cutoff).await?;
            output::print_success(&format!("Purged {} hook(s)", purged));
        }
        HooksCommand::Enqueue {
            receiver_id,
            receiver_kind,
            event_type,
            params,
            delay_seconds,
            description,
        } => {
            let params: serde_json::Value = serde_json::from_str(params)
                .map_err(|e| AppError::validation(format!("--params is not valid JSON: {}", e)))?;

            let mut new_hook = NewHook::new(*receiver_id, *receiver_kind, *event_type, params);
            if let Some(seconds) = delay_seconds {
                new_hook = new_hook.delay(Duration::from_secs(*seconds));
            }
            if let Some(description) = description {
                new_hook = new_hook.describe(description.clone());
            }

            let hook = HookCreator::new(store.clone()).append(new_hook).await?;
            output::print_success(&format!(
                "Enqueued hook {} ({}) due at {}",
                hook.id,
                hook.event_type,
                hook.execution_timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
    }

    pool.close().await;
    Ok(())
}

async fn apply(
    store: &PgHookStore,
    id: HookId,
    transition: ManualTransition,
    lease_duration: chrono::Duration,
) -> Result<(), AppError> {
    match store
        .transition(id, transition, Utc::now(), lease_duration)
        .await?
    {
        Some(hook) => {
            output::print_success(&format!("Hook {} is now {}", hook.id, hook.status));
        }
        None => {
            let current = store
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Hook {} not found", id)))?;
            output::print_warning(&format!(
                "Cannot {} hook {}: status is {} or it is leased by a worker",
                transition, id, current.status
            ));
        }
    }
    Ok(())
}
