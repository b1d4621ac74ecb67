//! Email-campaign provider handler: contact sync and transactional mail.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing;

use hookbox_core::result::AppResult;
use hookbox_entity::hook::{Channel, EventType, Hook};

use super::{ensure_channel, required_str};
use crate::adapters::{DeliveryAdapter, DeliveryRequest};
use crate::dispatcher::{DeliveryOutcome, HookHandler};
use crate::error::DeliveryError;

/// Handles `mail.*` hooks.
#[derive(Debug)]
pub struct MailHandler {
    event_type: EventType,
    adapter: Arc<dyn DeliveryAdapter>,
}

impl MailHandler {
    /// Create a handler for one mail event type.
    pub fn new(event_type: EventType, adapter: Arc<dyn DeliveryAdapter>) -> AppResult<Self> {
        ensure_channel(event_type, Channel::Mail)?;
        Ok(Self {
            event_type,
            adapter,
        })
    }

    fn unsubscribed(hook: &Hook) -> bool {
        hook.params.get("subscribed").and_then(|v| v.as_bool()) == Some(false)
    }
}

#[async_trait]
impl HookHandler for MailHandler {
    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn validate(&self, hook: &Hook) -> Result<(), DeliveryError> {
        let email = required_str(hook, "email")?;
        if !email.contains('@') {
            return Err(DeliveryError::Permanent(format!(
                "Hook {} has an invalid email address '{}'",
                hook.id, email
            )));
        }
        if self.event_type == EventType::MailTransactional {
            required_str(hook, "template")?;
        }
        Ok(())
    }

    async fn process(&self, hook: &Hook) -> Result<DeliveryOutcome, DeliveryError> {
        if Self::unsubscribed(hook) {
            tracing::info!("Hook {}: recipient unsubscribed, not sending", hook.id);
            return Ok(DeliveryOutcome::Ignored("recipient unsubscribed".to_string()));
        }

        let body = json!({
            "event": self.event_type.as_str(),
            "receiver_id": hook.receiver_entity_id,
            "params": hook.params,
        });
        let response = self
            .adapter
            .send(DeliveryRequest::new(hook.id, body))
            .await?;
        Ok(DeliveryOutcome::Delivered(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{RecordingAdapter, hook};

    fn handler(event_type: EventType) -> (MailHandler, Arc<RecordingAdapter>) {
        let adapter = Arc::new(RecordingAdapter::default());
        (MailHandler::new(event_type, adapter.clone()).unwrap(), adapter)
    }

    #[test]
    fn test_rejects_foreign_event_type() {
        let adapter = Arc::new(RecordingAdapter::default());
        let err = MailHandler::new(EventType::PushNotification, adapter).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validation() {
        let (sync, _) = handler(EventType::MailContactSync);
        assert!(sync.validate(&hook("mail.contact_sync", json!({ "email": "a@b.io" }))).is_ok());
        assert!(sync.validate(&hook("mail.contact_sync", json!({ "email": "nope" }))).is_err());
        assert!(sync.validate(&hook("mail.contact_sync", json!({}))).is_err());

        let (transactional, _) = handler(EventType::MailTransactional);
        let missing_template = hook("mail.transactional", json!({ "email": "a@b.io" }));
        assert!(matches!(
            transactional.validate(&missing_template),
            Err(DeliveryError::Permanent(_))
        ));
        let complete = hook(
            "mail.transactional",
            json!({ "email": "a@b.io", "template": "welcome" }),
        );
        assert!(transactional.validate(&complete).is_ok());
    }

    #[tokio::test]
    async fn test_unsubscribed_is_ignored() {
        let (sync, adapter) = handler(EventType::MailContactSync);
        let outcome = sync
            .process(&hook(
                "mail.contact_sync",
                json!({ "email": "a@b.io", "subscribed": false }),
            ))
            .await
            .unwrap();
        assert!(matches!(outcome, DeliveryOutcome::Ignored(_)));
        assert!(adapter.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_sends_params() {
        let (sync, adapter) = handler(EventType::MailContactSync);
        let outcome = sync
            .process(&hook("mail.contact_sync", json!({ "email": "a@b.io" })))
            .await
            .unwrap();
        assert!(matches!(outcome, DeliveryOutcome::Delivered(_)));

        let requests = adapter.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body["event"], "mail.contact_sync");
        assert_eq!(requests[0].body["params"]["email"], "a@b.io");
        assert!(requests[0].url.is_none());
    }
}
