//! Hook entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hookbox_core::result::AppResult;
use hookbox_core::types::{HookId, LockToken, ReceiverId};

use super::event_type::EventType;
use super::receiver::ReceiverKind;
use super::status::HookStatus;

/// A durable record of pending work to deliver.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hook {
    /// Unique hook identifier.
    pub id: HookId,
    /// Business entity the hook concerns.
    pub receiver_entity_id: ReceiverId,
    /// Kind of the business entity.
    pub receiver_entity_kind: ReceiverKind,
    /// Raw event type; parse with [`Hook::parsed_event_type`].
    pub event_type: String,
    /// Free-text audit note.
    pub custom_description: Option<String>,
    /// Earliest time the hook may be claimed.
    pub execution_timestamp: DateTime<Utc>,
    /// Lease token of the current owner.
    pub lock_identifier: Option<LockToken>,
    /// When the current lease was taken.
    pub locked_at: Option<DateTime<Utc>>,
    /// Current status.
    pub status: HookStatus,
    /// Number of failed delivery attempts.
    pub failed_count: i32,
    /// Payload handed to the delivery adapter verbatim.
    pub params: serde_json::Value,
    /// Last successful outcome.
    pub success_response: Option<serde_json::Value>,
    /// Last failed outcome.
    pub failed_response: Option<serde_json::Value>,
    /// When the hook was created.
    pub created_at: DateTime<Utc>,
    /// When the hook was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The lease columns of a claimed hook, read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    /// Fencing token of the owner.
    pub token: LockToken,
    /// When the lease was taken.
    pub locked_at: DateTime<Utc>,
}

impl Lease {
    /// Check if the lease has run out at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, lease_duration: Duration) -> bool {
        self.locked_at < now - lease_duration
    }
}

impl Hook {
    /// Return the lease, if both lease columns are set.
    pub fn lease(&self) -> Option<Lease> {
        match (self.lock_identifier, self.locked_at) {
            (Some(token), Some(locked_at)) => Some(Lease { token, locked_at }),
            _ => None,
        }
    }

    /// Parse the stored event type.
    pub fn parsed_event_type(&self) -> AppResult<EventType> {
        self.event_type.parse()
    }

    /// Check if the execution timestamp has arrived.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.execution_timestamp <= now
    }

    /// Check if a poller running at `now` may claim this hook.
    pub fn is_claimable_at(&self, now: DateTime<Utc>, lease_duration: Duration) -> bool {
        if !self.status.is_claimable() || !self.is_due(now) {
            return false;
        }
        match (self.lock_identifier, self.locked_at) {
            (None, _) => true,
            (Some(_), Some(locked_at)) => locked_at < now - lease_duration,
            (Some(_), None) => false,
        }
    }
}

/// Data required to append a new hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHook {
    /// Business entity the hook concerns.
    pub receiver_entity_id: ReceiverId,
    /// Kind of the business entity.
    pub receiver_entity_kind: ReceiverKind,
    /// Handler selector.
    pub event_type: EventType,
    /// Free-text audit note.
    pub custom_description: Option<String>,
    /// Earliest time the hook may be claimed.
    pub execution_timestamp: DateTime<Utc>,
    /// Payload for the delivery adapter.
    pub params: serde_json::Value,
}
