//! Delivery adapters — the outbound side of a handler.
//!
//! Handlers validate and shape a hook's params; an adapter carries the
//! result to the external service and classifies what came back.

pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use hookbox_core::types::HookId;

use crate::error::DeliveryError;

pub use self::http::HttpDeliveryAdapter;

/// One outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRequest {
    /// Hook being delivered, sent along as an idempotency key.
    pub hook_id: HookId,
    /// Target URL, for adapters without a fixed endpoint.
    pub url: Option<String>,
    /// JSON body.
    pub body: Value,
}

impl DeliveryRequest {
    /// A request to the adapter's own endpoint.
    pub fn new(hook_id: HookId, body: Value) -> Self {
        Self {
            hook_id,
            url: None,
            body,
        }
    }

    /// A request to an explicit URL.
    pub fn to_url(hook_id: HookId, url: impl Into<String>, body: Value) -> Self {
        Self {
            hook_id,
            url: Some(url.into()),
            body,
        }
    }
}

/// Sends delivery requests to an external service.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync + fmt::Debug {
    /// Name used in logs and responses.
    fn name(&self) -> &str;

    /// Perform the call. `Ok` carries the value recorded as the success response.
    async fn send(&self, request: DeliveryRequest) -> Result<Value, DeliveryError>;
}
