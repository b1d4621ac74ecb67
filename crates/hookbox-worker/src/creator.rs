//! Producer-side API for enqueueing hooks.
//!
//! Business code appends hooks inside its own transaction with
//! [`HookCreator::append_in`], so a hook exists exactly when the change
//! that caused it was committed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgExecutor;
use tracing;

use hookbox_core::error::AppError;
use hookbox_core::result::AppResult;
use hookbox_core::types::ReceiverId;
use hookbox_database::HookStore;
use hookbox_database::repositories::append_in;
use hookbox_entity::hook::{CreateHook, EventType, Hook, ReceiverKind};

/// A hook about to be appended.
#[derive(Debug, Clone)]
pub struct NewHook {
    receiver_entity_id: ReceiverId,
    receiver_entity_kind: ReceiverKind,
    event_type: EventType,
    params: Value,
    custom_description: Option<String>,
    execution_timestamp: Option<DateTime<Utc>>,
    delay: Option<Duration>,
}

impl NewHook {
    /// A hook due immediately.
    pub fn new(
        receiver_entity_id: impl Into<ReceiverId>,
        receiver_entity_kind: ReceiverKind,
        event_type: EventType,
        params: Value,
    ) -> Self {
        Self {
            receiver_entity_id: receiver_entity_id.into(),
            receiver_entity_kind,
            event_type,
            params,
            custom_description: None,
            execution_timestamp: None,
            delay: None,
        }
    }

    /// Do not deliver before `at`.
    pub fn execute_at(mut self, at: DateTime<Utc>) -> Self {
        self.execution_timestamp = Some(at);
        self.delay = None;
        self
    }

    /// Do not deliver before `delay` from the time of append.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self.execution_timestamp = None;
        self
    }

    /// Attach a free-text audit note.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.custom_description = Some(description.into());
        self
    }

    /// Resolve into the row to insert, relative to `now`.
    pub fn into_create(self, now: DateTime<Utc>) -> AppResult<CreateHook> {
        if !self.params.is_object() {
            return Err(AppError::validation(format!(
                "params for '{}' must be a JSON object",
                self.event_type
            )));
        }

        let execution_timestamp = match (self.execution_timestamp, self.delay) {
            (Some(at), _) => at,
            (None, Some(delay)) => {
                let delay = chrono::Duration::from_std(delay)
                    .map_err(|e| AppError::validation(format!("delay out of range: {e}")))?;
                now + delay
            }
            (None, None) => now,
        };

        Ok(CreateHook {
            receiver_entity_id: self.receiver_entity_id,
            receiver_entity_kind: self.receiver_entity_kind,
            event_type: self.event_type,
            custom_description: self.custom_description,
            execution_timestamp,
            params: self.params,
        })
    }
}

/// Appends hooks on behalf of business logic.
#[derive(Debug, Clone)]
pub struct HookCreator {
    store: Arc<dyn HookStore>,
}

impl HookCreator {
    /// Create a creator writing to `store`.
    pub fn new(store: Arc<dyn HookStore>) -> Self {
        Self { store }
    }

    /// Append a hook in its own write.
    pub async fn append(&self, hook: NewHook) -> AppResult<Hook> {
        let create = hook.into_create(Utc::now())?;
        let stored = self.store.append(&create).await?;
        tracing::debug!(
            "Appended hook {} ({}) due at {}",
            stored.id,
            stored.event_type,
            stored.execution_timestamp
        );
        Ok(stored)
    }

    /// Append a hook through `executor`, typically the caller's open transaction.
    pub async fn append_in<'e, E>(executor: E, hook: NewHook) -> AppResult<Hook>
    where
        E: PgExecutor<'e>,
    {
        let create = hook.into_create(Utc::now())?;
        append_in(executor, &create).await
    }
}
