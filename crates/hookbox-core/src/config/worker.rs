//! Poller worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for one poller worker process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Stable identifier used in logs. Generated at startup when absent.
    #[serde(default)]
    pub worker_id: Option<String>,
    /// Interval in seconds between polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum number of hooks claimed per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Maximum number of claimed hooks delivered at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// How long a claim stays valid before another worker may reclaim it.
    #[serde(default = "default_lease_duration")]
    pub lease_duration_seconds: u64,
    /// Upper bound on a single handler call.
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_seconds: u64,
    /// Exit after this many minutes so the supervisor can respawn the worker.
    #[serde(default)]
    pub max_runtime_minutes: Option<u64>,
}

impl WorkerConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Lease duration as a [`Duration`].
    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_duration_seconds)
    }

    /// Delivery timeout as a [`Duration`].
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_seconds)
    }

    /// Longest a claimed hook can wait for its turn and then run.
    ///
    /// With `concurrency` deliveries in flight, the last hook of a full
    /// batch starts after `ceil(batch_size / concurrency) - 1` timeouts and
    /// ends one timeout later. The lease must outlast this.
    pub fn tick_budget(&self) -> Duration {
        let rounds = u64::from(self.batch_size).div_ceil(self.concurrency.max(1) as u64);
        Duration::from_secs(rounds.saturating_mul(self.delivery_timeout_seconds))
    }

    /// Maximum runtime, if configured.
    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime_minutes
            .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_id: None,
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            lease_duration_seconds: default_lease_duration(),
            delivery_timeout_seconds: default_delivery_timeout(),
            max_runtime_minutes: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    5
}

fn default_batch_size() -> u32 {
    10
}

fn default_concurrency() -> usize {
    4
}

fn default_lease_duration() -> u64 {
    300
}

fn default_delivery_timeout() -> u64 {
    60
}
