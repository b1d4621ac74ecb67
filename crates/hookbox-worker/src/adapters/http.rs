//! JSON-over-HTTP delivery adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing;

use hookbox_core::config::{ApiAdapterConfig, WebhookAdapterConfig};
use hookbox_core::error::{AppError, ErrorKind};
use hookbox_core::result::AppResult;

use super::{DeliveryAdapter, DeliveryRequest};
use crate::error::DeliveryError;

/// Longest response body kept in a hook's response column.
const MAX_RECORDED_BODY: usize = 1024;

/// Posts JSON to an HTTP endpoint.
///
/// API adapters post every request to one configured endpoint; the webhook
/// adapter posts to the URL carried by each request.
#[derive(Debug, Clone)]
pub struct HttpDeliveryAdapter {
    name: String,
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl HttpDeliveryAdapter {
    /// Adapter for a provider API with a fixed endpoint.
    pub fn api(name: impl Into<String>, config: &ApiAdapterConfig) -> AppResult<Self> {
        let name = name.into();
        if config.endpoint.trim().is_empty() {
            return Err(AppError::configuration(format!(
                "adapters.{name}.endpoint must be set"
            )));
        }
        let client = build_client(config.timeout(), &default_user_agent())?;
        Ok(Self {
            name,
            client,
            endpoint: Some(config.endpoint.clone()),
            api_key: config.api_key.clone(),
        })
    }

    /// Adapter for outbound webhooks; every request names its own URL.
    pub fn webhook(config: &WebhookAdapterConfig) -> AppResult<Self> {
        let client = build_client(config.timeout(), &config.user_agent)?;
        Ok(Self {
            name: "webhook".to_string(),
            client,
            endpoint: None,
            api_key: None,
        })
    }

    fn target<'a>(&'a self, request: &'a DeliveryRequest) -> Result<&'a str, DeliveryError> {
        request
            .url
            .as_deref()
            .or(self.endpoint.as_deref())
            .ok_or_else(|| {
                DeliveryError::Permanent(format!("{} adapter needs a target URL", self.name))
            })
    }
}

fn default_user_agent() -> String {
    format!("hookbox/{}", env!("CARGO_PKG_VERSION"))
}

fn build_client(timeout: Duration, user_agent: &str) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to build HTTP client: {e}"),
                e,
            )
        })
}

/// Map a non-success status to a delivery error.
fn classify(status: StatusCode, body: &str) -> DeliveryError {
    let message = format!("HTTP {}: {}", status.as_u16(), body);
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        DeliveryError::Transient(message)
    } else {
        DeliveryError::Permanent(message)
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_RECORDED_BODY {
        return body;
    }
    let mut end = MAX_RECORDED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[async_trait]
impl DeliveryAdapter for HttpDeliveryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: DeliveryRequest) -> Result<Value, DeliveryError> {
        let url = self.target(&request)?;

        let mut http_request = self
            .client
            .post(url)
            .header("Idempotency-Key", request.hook_id.to_string())
            .json(&request.body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = match http_request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} request to {} failed: {}", self.name, url, e);
                if e.is_timeout() {
                    return Err(DeliveryError::Transient(format!("request timed out: {e}")));
                }
                if e.is_connect() {
                    return Err(DeliveryError::Transient(format!("connection failed: {e}")));
                }
                if e.is_builder() {
                    return Err(DeliveryError::Permanent(format!("invalid request: {e}")));
                }
                return Err(DeliveryError::Transient(e.to_string()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => format!("[failed to read response body: {e}]"),
        };
        let body = truncate(&body);

        if !status.is_success() {
            tracing::debug!("{} responded {} for hook {}", self.name, status, request.hook_id);
            return Err(classify(status, body));
        }

        let recorded = serde_json::from_str::<Value>(body).unwrap_or_else(|_| json!(body));
        Ok(json!({
            "adapter": self.name,
            "status": status.as_u16(),
            "body": recorded,
        }))
    }
}
