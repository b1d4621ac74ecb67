//! Push-notification provider handler.

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

/// Handles `push.notification` hooks.
#[derive(Debug)]
pub struct PushHandler {
    event_type: EventType,
    adapter: Arc<dyn DeliveryAdapter>,
}

impl PushHandler {
    /// Create a handler for a push event type.
    pub fn new(event_type: EventType, adapter: Arc<dyn DeliveryAdapter>) -> AppResult<Self> {
        ensure_channel(event_type, Channel::Push)?;
        Ok(Self {
            event_type,
            adapter,
        })
    }
}

#[async_trait]
impl HookHandler for PushHandler {
    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn validate(&self, hook: &Hook) -> Result<(), DeliveryError> {
        required_str(hook, "message")?;
        match hook.params.get("device_tokens") {
            None => Ok(()),
            Some(tokens) if tokens.is_array() => Ok(()),
            Some(_) => Err(DeliveryError::Permanent(format!(
                "Hook {}: 'device_tokens' must be an array",
                hook.id
            ))),
        }
    }

    async fn process(&self, hook: &Hook) -> Result<DeliveryOutcome, DeliveryError> {
        let no_devices = hook
            .params
            .get("device_tokens")
            .and_then(|v| v.as_array())
            .is_some_and(|tokens| tokens.is_empty());
        if no_devices {
            tracing::info!("Hook {}: receiver has no registered devices", hook.id);
            return Ok(DeliveryOutcome::Ignored("no registered devices".to_string()));
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

    fn handler() -> (PushHandler, Arc<RecordingAdapter>) {
        let adapter = Arc::new(RecordingAdapter::default());
        (
            PushHandler::new(EventType::PushNotification, adapter.clone()).unwrap(),
            adapter,
        )
    }

    #[test]
    fn test_requires_message() {
        let (push, _) = handler();
        assert!(push.validate(&hook("push.notification", json!({}))).is_err());
        assert!(
            push.validate(&hook("push.notification", json!({ "message": "  " })))
                .is_err()
        );
        assert!(
            push.validate(&hook(
                "push.notification",
                json!({ "message": "hi", "device_tokens": "abc" })
            ))
            .is_err()
        );
        assert!(
            push.validate(&hook("push.notification", json!({ "message": "hi" })))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_empty_device_list_is_ignored() {
        let (push, adapter) = handler();
        let outcome = push
            .process(&hook(
                "push.notification",
                json!({ "message": "hi", "device_tokens": [] }),
            ))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DeliveryOutcome::Ignored("no registered devices".to_string())
        );
        assert!(adapter.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivers_to_devices() {
        let (push, adapter) = handler();
        push.process(&hook(
            "push.notification",
            json!({ "message": "hi", "device_tokens": ["t1"] }),
        ))
        .await
        .unwrap();
        assert_eq!(adapter.requests.lock().unwrap().len(), 1);
    }
}
