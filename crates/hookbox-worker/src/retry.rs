//! Failure bookkeeping and backoff scheduling.
//!
//! Every transient failure increments `failed_count`. Below the retry limit
//! the hook goes back to `QUEUED` with its execution timestamp pushed
//! forward; reaching the limit ends it in `COMPLETELY_FAILED`. Permanent
//! failures end the hook immediately without consuming a retry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{Value, json};

use hookbox_core::config::{BackoffStrategy, RetryConfig};
use hookbox_entity::hook::{Hook, HookResolution};

use crate::error::DeliveryError;

/// Retry limit and backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Failed deliveries after which the hook is completely failed.
    pub retry_limit: u32,
    /// How delays grow with the failure count.
    pub strategy: BackoffStrategy,
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Fraction of the delay added as random jitter.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build the policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            retry_limit: config.retry_limit,
            strategy: config.strategy,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            jitter_factor: config.jitter_factor,
        }
    }

    fn limit(&self) -> i32 {
        i32::try_from(self.retry_limit).unwrap_or(i32::MAX)
    }

    /// Delay before the next attempt after `failed_count` failures, without jitter.
    pub fn backoff(&self, failed_count: u32) -> Duration {
        let attempt = failed_count.max(1);
        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt),
            BackoffStrategy::Exponential => {
                let exponent = (attempt - 1).min(20);
                self.base_delay.saturating_mul(2_u32.saturating_pow(exponent))
            }
        };
        delay.min(self.max_delay).max(Duration::from_millis(1))
    }

    /// Delay before the next attempt, with jitter applied.
    ///
    /// Jitter only ever adds time, so the jittered delay is at least the
    /// plain backoff and never exceeds `max_delay`.
    pub fn delay_for(&self, failed_count: u32) -> Duration {
        let delay = self.backoff(failed_count);
        let jitter = self.jitter_factor.clamp(0.0, 1.0);
        if jitter <= 0.0 {
            return delay;
        }

        let spread = delay.as_secs_f64() * jitter;
        let offset = rand::rng().random_range(0.0..=spread);
        let jittered = delay + Duration::from_secs_f64(offset);
        jittered.min(self.max_delay.max(delay))
    }

    /// Earliest time of the next attempt for a hook that failed at `now`.
    pub fn next_attempt_at(&self, hook: &Hook, failed_count: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        let base = now.max(hook.execution_timestamp);
        let delay = chrono::Duration::from_std(self.delay_for(failed_count))
            .unwrap_or(chrono::Duration::MAX);
        base.checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Resolution for a delivered hook.
    pub fn on_success(&self, hook: &Hook, response: Value) -> HookResolution {
        HookResolution::completed(hook.failed_count, response)
    }

    /// Resolution for a hook its handler chose not to deliver.
    pub fn on_ignored(&self, hook: &Hook, reason: &str) -> HookResolution {
        HookResolution::ignored(hook.failed_count, json!({ "ignored": reason }))
    }

    /// Resolution for a failure that consumes one retry.
    pub fn on_transient_failure(
        &self,
        hook: &Hook,
        error: &DeliveryError,
        now: DateTime<Utc>,
    ) -> HookResolution {
        let failed_count = hook.failed_count.saturating_add(1).min(self.limit());
        let response = error.to_response(failed_count);

        if failed_count >= self.limit() {
            return HookResolution::completely_failed(failed_count, response);
        }

        let next = self.next_attempt_at(hook, failed_count.unsigned_abs(), now);
        HookResolution::retry(failed_count, next, response)
    }

    /// Resolution for a failure no retry can fix.
    pub fn on_permanent_failure(&self, hook: &Hook, error: &DeliveryError) -> HookResolution {
        HookResolution::completely_failed(hook.failed_count, error.to_response(hook.failed_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbox_core::types::{HookId, ReceiverId};
    use hookbox_entity::hook::{HookStatus, ReceiverKind};

    fn policy(strategy: BackoffStrategy, jitter_factor: f64) -> RetryPolicy {
        RetryPolicy {
            retry_limit: 3,
            strategy,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(100),
            jitter_factor,
        }
    }

    fn hook(failed_count: i32, execution_timestamp: DateTime<Utc>) -> Hook {
        Hook {
            id: HookId(1),
            receiver_entity_id: ReceiverId(1),
            receiver_entity_kind: ReceiverKind::User,
            event_type: "push.notification".to_string(),
            custom_description: None,
            execution_timestamp,
            lock_identifier: None,
            locked_at: None,
            status: HookStatus::Queued,
            failed_count,
            params: json!({}),
            success_response: None,
            failed_response: None,
            created_at: execution_timestamp,
            updated_at: execution_timestamp,
        }
    }

    #[test]
    fn test_exponential_backoff_doubles_and_caps() {
        let p = policy(BackoffStrategy::Exponential, 0.0);
        assert_eq!(p.backoff(1), Duration::from_secs(10));
        assert_eq!(p.backoff(2), Duration::from_secs(20));
        assert_eq!(p.backoff(3), Duration::from_secs(40));
        assert_eq!(p.backoff(5), Duration::from_secs(100));
        assert_eq!(p.backoff(u32::MAX), Duration::from_secs(100));
    }

    #[test]
    fn test_linear_and_fixed_backoff() {
        let linear = policy(BackoffStrategy::Linear, 0.0);
        assert_eq!(linear.backoff(3), Duration::from_secs(30));
        let fixed = policy(BackoffStrategy::Fixed, 0.0);
        assert_eq!(fixed.backoff(3), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let p = policy(BackoffStrategy::Exponential, 0.5);
        for _ in 0..200 {
            let delay = p.delay_for(2);
            assert!(delay >= Duration::from_secs(20));
            assert!(delay <= Duration::from_secs(30));
        }
        for _ in 0..50 {
            assert!(p.delay_for(10) <= Duration::from_secs(100));
        }
    }

    #[test]
    fn test_retry_bound_is_exact() {
        let p = policy(BackoffStrategy::Exponential, 0.0);
        let now = Utc::now();
        let error = DeliveryError::Transient("connection reset".into());

        let first = p.on_transient_failure(&hook(0, now), &error, now);
        assert_eq!(first.status, HookStatus::Queued);
        assert_eq!(first.failed_count, 1);

        let second = p.on_transient_failure(&hook(1, now), &error, now);
        assert_eq!(second.status, HookStatus::Queued);
        assert_eq!(second.failed_count, 2);

        let third = p.on_transient_failure(&hook(2, now), &error, now);
        assert_eq!(third.status, HookStatus::CompletelyFailed);
        assert_eq!(third.failed_count, 3);
        assert!(third.execution_timestamp.is_none());
    }

    #[test]
    fn test_failed_count_never_exceeds_limit() {
        let p = policy(BackoffStrategy::Fixed, 0.0);
        let now = Utc::now();
        let error = DeliveryError::Transient("timeout".into());
        let resolution = p.on_transient_failure(&hook(3, now), &error, now);
        assert_eq!(resolution.failed_count, 3);
        assert_eq!(resolution.status, HookStatus::CompletelyFailed);
    }

    #[test]
    fn test_next_attempt_strictly_after_previous_schedule() {
        let p = policy(BackoffStrategy::Fixed, 0.0);
        let scheduled = Utc::now();
        let error = DeliveryError::Transient("503".into());

        // A clock behind the stored schedule still pushes it forward.
        let skewed_now = scheduled - chrono::Duration::seconds(30);
        let resolution = p.on_transient_failure(&hook(0, scheduled), &error, skewed_now);
        let next = resolution.execution_timestamp.unwrap();
        assert_eq!(next, scheduled + chrono::Duration::seconds(10));
    }

    #[test]
    fn test_permanent_failure_keeps_count() {
        let p = policy(BackoffStrategy::Exponential, 0.0);
        let error = DeliveryError::Permanent("unknown recipient".into());
        let resolution = p.on_permanent_failure(&hook(1, Utc::now()), &error);
        assert_eq!(resolution.status, HookStatus::CompletelyFailed);
        assert_eq!(resolution.failed_count, 1);
        assert_eq!(resolution.failed_response.unwrap()["error"], "permanent");
    }
}
