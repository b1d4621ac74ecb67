//! Delivery adapter endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for all delivery adapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdaptersConfig {
    /// Email-campaign API client.
    #[serde(default)]
    pub mail: ApiAdapterConfig,
    /// Push-notification API client.
    #[serde(default)]
    pub push: ApiAdapterConfig,
    /// Outbound webhook poster.
    #[serde(default)]
    pub webhook: WebhookAdapterConfig,
}

/// An adapter that posts every hook to one fixed API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAdapterConfig {
    /// Endpoint URL receiving the hook params as JSON.
    #[serde(default)]
    pub endpoint: String,
    /// Bearer token sent with each request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl ApiAdapterConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ApiAdapterConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

/// The outbound webhook poster. Target URLs come from each hook's params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAdapterConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// `User-Agent` header sent to subscribers.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl WebhookAdapterConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for WebhookAdapterConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("hookbox/{}", env!("CARGO_PKG_VERSION"))
}
