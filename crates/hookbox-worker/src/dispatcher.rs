//! Dispatcher — routes a claimed hook to the handler for its event type.
//!
//! The registry is checked when it is built: every [`EventType`] must have
//! exactly one handler, so a deployment missing a handler refuses to start
//! instead of silently dropping hooks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use hookbox_core::error::AppError;
use hookbox_core::result::AppResult;
use hookbox_entity::hook::{EventType, Hook};

use crate::error::DeliveryError;

/// What a handler did with a hook.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// Delivered; the value is recorded as the success response.
    Delivered(Value),
    /// Deliberately not delivered; the reason is recorded.
    Ignored(String),
}

/// Delivers hooks of one event type.
#[async_trait]
pub trait HookHandler: Send + Sync + fmt::Debug {
    /// The event type this handler processes.
    fn event_type(&self) -> EventType;

    /// Check the hook's params before delivery.
    ///
    /// Errors returned here are treated like errors from [`process`](Self::process).
    fn validate(&self, _hook: &Hook) -> Result<(), DeliveryError> {
        Ok(())
    }

    /// Deliver the hook.
    async fn process(&self, hook: &Hook) -> Result<DeliveryOutcome, DeliveryError>;
}

/// Collects handlers and produces a validated [`Dispatcher`].
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    handlers: Vec<Arc<dyn HookHandler>>,
}

impl DispatcherBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    pub fn register(&mut self, handler: Arc<dyn HookHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Build the dispatcher, failing if any event type has no handler or more than one.
    pub fn build(&mut self) -> AppResult<Dispatcher> {
        let mut handlers: HashMap<EventType, Arc<dyn HookHandler>> = HashMap::new();

        for handler in self.handlers.drain(..) {
            let event_type = handler.event_type();
            if handlers.contains_key(&event_type) {
                return Err(AppError::configuration(format!(
                    "Duplicate handler registered for event type '{event_type}'"
                )));
            }
            tracing::info!("Registered hook handler for type '{}'", event_type);
            handlers.insert(event_type, handler);
        }

        let missing: Vec<&str> = EventType::ALL
            .iter()
            .filter(|event_type| !handlers.contains_key(event_type))
            .map(EventType::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::configuration(format!(
                "No handler registered for event type(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Dispatcher { handlers })
    }
}

/// Exhaustive event type → handler registry.
#[derive(Debug)]
pub struct Dispatcher {
    handlers: HashMap<EventType, Arc<dyn HookHandler>>,
}

impl Dispatcher {
    /// Start building a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Validate and deliver a hook with the handler for its event type.
    ///
    /// A stored event type this build does not know is a
    /// [`DeliveryError::Configuration`].
    pub async fn dispatch(&self, hook: &Hook) -> Result<DeliveryOutcome, DeliveryError> {
        let event_type = hook
            .parsed_event_type()
            .map_err(|e| DeliveryError::Configuration(e.message))?;

        let handler = self.handlers.get(&event_type).ok_or_else(|| {
            DeliveryError::Configuration(format!(
                "No handler registered for event type '{event_type}'"
            ))
        })?;

        tracing::debug!(
            "Dispatching hook: id={}, type='{}', failed_count={}",
            hook.id,
            event_type,
            hook.failed_count
        );

        handler.validate(hook)?;
        handler.process(hook).await
    }

    /// Event types with a registered handler, in declaration order.
    pub fn registered_types(&self) -> Vec<EventType> {
        EventType::ALL
            .into_iter()
            .filter(|event_type| self.handlers.contains_key(event_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hookbox_core::types::{HookId, ReceiverId};
    use hookbox_entity::hook::{HookStatus, ReceiverKind};
    use serde_json::json;

    #[derive(Debug)]
    struct Echo(EventType);

    #[async_trait]
    impl HookHandler for Echo {
        fn event_type(&self) -> EventType {
            self.0
        }

        fn validate(&self, hook: &Hook) -> Result<(), DeliveryError> {
            if hook.params.get("reject").is_some() {
                return Err(DeliveryError::Permanent("rejected".into()));
            }
            Ok(())
        }

        async fn process(&self, hook: &Hook) -> Result<DeliveryOutcome, DeliveryError> {
            Ok(DeliveryOutcome::Delivered(
                json!({ "handled_by": self.0.as_str(), "id": hook.id }),
            ))
        }
    }

    fn full_builder() -> DispatcherBuilder {
        let mut builder = Dispatcher::builder();
        for event_type in EventType::ALL {
            builder.register(Arc::new(Echo(event_type)));
        }
        builder
    }

    fn hook(event_type: &str, params: Value) -> Hook {
        let now = Utc::now();
        Hook {
            id: HookId(7),
            receiver_entity_id: ReceiverId(1),
            receiver_entity_kind: ReceiverKind::Video,
            event_type: event_type.to_string(),
            custom_description: None,
            execution_timestamp: now,
            lock_identifier: None,
            locked_at: None,
            status: HookStatus::Queued,
            failed_count: 0,
            params,
            success_response: None,
            failed_response: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_build_rejects_missing_handler() {
        let mut builder = Dispatcher::builder();
        builder.register(Arc::new(Echo(EventType::PushNotification)));
        let err = builder.build().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.message.contains("mail.transactional"));
        assert!(!err.message.contains("push.notification"));
    }

    #[test]
    fn test_build_rejects_duplicate_handler() {
        let mut builder = full_builder();
        builder.register(Arc::new(Echo(EventType::MailContactSync)));
        let err = builder.build().unwrap_err();
        assert!(err.message.contains("Duplicate"));
    }

    #[test]
    fn test_registered_types_cover_all() {
        let dispatcher = full_builder().build().unwrap();
        assert_eq!(dispatcher.registered_types(), EventType::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_event_type() {
        let dispatcher = full_builder().build().unwrap();
        let outcome = dispatcher
            .dispatch(&hook("webhook.video_updated", json!({})))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DeliveryOutcome::Delivered(json!({ "handled_by": "webhook.video_updated", "id": 7 }))
        );
    }

    #[tokio::test]
    async fn test_dispatch_unknown_event_type_is_configuration_error() {
        let dispatcher = full_builder().build().unwrap();
        let err = dispatcher
            .dispatch(&hook("sms.send", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_validation_runs_before_process() {
        let dispatcher = full_builder().build().unwrap();
        let err = dispatcher
            .dispatch(&hook("push.notification", json!({ "reject": true })))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Permanent(_)));
    }
}
