//! Retry and backoff configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Strategy for spacing out retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Same delay after every failure.
    Fixed,
    /// Delay grows by the base amount per failure.
    Linear,
    /// Delay doubles per failure.
    Exponential,
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Linear => write!(f, "linear"),
            Self::Exponential => write!(f, "exponential"),
        }
    }
}

/// Retry bookkeeping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of failed deliveries after which a hook is completely failed.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
    /// Backoff strategy.
    #[serde(default = "default_strategy")]
    pub strategy: BackoffStrategy,
    /// Delay after the first failure, in seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_seconds: u64,
    /// Upper bound on the computed delay, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: u64,
    /// Fraction of the delay added as random jitter (0.0 to 1.0).
    #[serde(default = "default_jitter")]
    pub jitter_factor: f64,
}

impl RetryConfig {
    /// Base delay as a [`Duration`].
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_seconds)
    }

    /// Maximum delay as a [`Duration`].
    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_seconds)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_limit: default_retry_limit(),
            strategy: default_strategy(),
            base_delay_seconds: default_base_delay(),
            max_delay_seconds: default_max_delay(),
            jitter_factor: default_jitter(),
        }
    }
}

fn default_retry_limit() -> u32 {
    3
}

fn default_strategy() -> BackoffStrategy {
    BackoffStrategy::Exponential
}

fn default_base_delay() -> u64 {
    30
}

fn default_max_delay() -> u64 {
    3600
}

fn default_jitter() -> f64 {
    0.2
}
