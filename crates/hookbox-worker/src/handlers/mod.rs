//! Built-in hook handler implementations, one per delivery channel.

pub mod mail;
pub mod push;
pub mod webhook;

use std::sync::Arc;

use hookbox_core::config::AdaptersConfig;
use hookbox_core::error::AppError;
use hookbox_core::result::AppResult;
use hookbox_entity::hook::{Channel, EventType, Hook};

use crate::adapters::{DeliveryAdapter, HttpDeliveryAdapter};
use crate::dispatcher::{Dispatcher, HookHandler};
use crate::error::DeliveryError;

pub use mail::MailHandler;
pub use push::PushHandler;
pub use webhook::WebhookHandler;

/// Build a dispatcher with the built-in handler for every event type,
/// delivering through HTTP adapters configured by `config`.
pub fn build_dispatcher(config: &AdaptersConfig) -> AppResult<Dispatcher> {
    let mail: Arc<dyn DeliveryAdapter> = Arc::new(HttpDeliveryAdapter::api("mail", &config.mail)?);
    let push: Arc<dyn DeliveryAdapter> = Arc::new(HttpDeliveryAdapter::api("push", &config.push)?);
    let webhook: Arc<dyn DeliveryAdapter> =
        Arc::new(HttpDeliveryAdapter::webhook(&config.webhook)?);

    let mut builder = Dispatcher::builder();
    for event_type in EventType::ALL {
        let handler: Arc<dyn HookHandler> = match event_type.channel() {
            Channel::Mail => Arc::new(MailHandler::new(event_type, mail.clone())?),
            Channel::Push => Arc::new(PushHandler::new(event_type, push.clone())?),
            Channel::Webhook => Arc::new(WebhookHandler::new(event_type, webhook.clone())?),
        };
        builder.register(handler);
    }
    builder.build()
}

/// Read a non-empty string param, or fail permanently.
pub(crate) fn required_str<'a>(hook: &'a Hook, key: &str) -> Result<&'a str, DeliveryError> {
    hook.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            DeliveryError::Permanent(format!(
                "Hook {} ({}) is missing param '{}'",
                hook.id, hook.event_type, key
            ))
        })
}

/// Reject an event type that belongs to another channel.
pub(crate) fn ensure_channel(event_type: EventType, channel: Channel) -> AppResult<()> {
    if event_type.channel() != channel {
        return Err(AppError::configuration(format!(
            "Event type '{event_type}' is delivered over {}, not {channel}",
            event_type.channel()
        )));
    }
    Ok(())
}
