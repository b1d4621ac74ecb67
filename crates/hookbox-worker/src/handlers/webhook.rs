//! Outbound webhook handler for video lifecycle events.

use std::sync::Arc;

use async_trait::async_trait;

use hookbox_core::result::AppResult;
use hookbox_entity::hook::{Channel, EventType, Hook};

use super::{ensure_channel, required_str};
use crate::adapters::{DeliveryAdapter, DeliveryRequest};
use crate::dispatcher::{DeliveryOutcome, HookHandler};
use crate::error::DeliveryError;

/// Handles `webhook.*` hooks by posting `params.payload` to `params.url`.
#[derive(Debug)]
pub struct WebhookHandler {
    event_type: EventType,
    adapter: Arc<dyn DeliveryAdapter>,
}

impl WebhookHandler {
    /// Create a handler for one webhook event type.
    pub fn new(event_type: EventType, adapter: Arc<dyn DeliveryAdapter>) -> AppResult<Self> {
        ensure_channel(event_type, Channel::Webhook)?;
        Ok(Self {
            event_type,
            adapter,
        })
    }
}

#[async_trait]
impl HookHandler for WebhookHandler {
    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn validate(&self, hook: &Hook) -> Result<(), DeliveryError> {
        let url = required_str(hook, "url")?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DeliveryError::Permanent(format!(
                "Hook {}: webhook url '{}' is not http(s)",
                hook.id, url
            )));
        }
        if hook.params.get("payload").is_none_or(|p| p.is_null()) {
            return Err(DeliveryError::Permanent(format!(
                "Hook {} is missing param 'payload'",
                hook.id
            )));
        }
        Ok(())
    }

    async fn process(&self, hook: &Hook) -> Result<DeliveryOutcome, DeliveryError> {
        let url = required_str(hook, "url")?;
        let payload = hook.params.get("payload").cloned().unwrap_or_default();
        let response = self
            .adapter
            .send(DeliveryRequest::to_url(hook.id, url, payload))
            .await?;
        Ok(DeliveryOutcome::Delivered(response))
    }
}
