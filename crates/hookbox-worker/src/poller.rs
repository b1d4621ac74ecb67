//! Poller — main loop that claims due hooks, dispatches them, and releases
//! each one with its resolution.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing;

use hookbox_core::config::WorkerConfig;
use hookbox_core::result::AppResult;
use hookbox_core::traits::{ErrorReport, ErrorSink, Severity};
use hookbox_entity::hook::{HookResolution, HookStatus};

use crate::dispatcher::{DeliveryOutcome, Dispatcher};
use crate::error::DeliveryError;
use crate::lease::{LeasedHook, LockManager, ReleaseOutcome};
use crate::retry::RetryPolicy;

/// Counts of what happened to the hooks claimed in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Hooks leased by the claim.
    pub claimed: usize,
    /// Delivered and marked `COMPLETED`.
    pub completed: usize,
    /// Closed as `IGNORED`.
    pub ignored: usize,
    /// Rescheduled for another attempt.
    pub retried: usize,
    /// Ended in `COMPLETELY_FAILED`.
    pub failed: usize,
    /// Lease lost before release, or too close to expiry to start a
    /// delivery; left for another worker.
    pub lost: usize,
    /// Could not be released because the store failed.
    pub errors: usize,
}

impl TickSummary {
    fn record(&mut self, processed: Processed) {
        match processed {
            Processed::Completed => self.completed += 1,
            Processed::Ignored => self.ignored += 1,
            Processed::Retried => self.retried += 1,
            Processed::Failed => self.failed += 1,
            Processed::Lost => self.lost += 1,
            Processed::Error => self.errors += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Processed {
    Completed,
    Ignored,
    Retried,
    Failed,
    Lost,
    Error,
}

/// Claim → dispatch → resolve loop run by each worker.
#[derive(Debug)]
pub struct Poller {
    worker_id: String,
    locks: LockManager,
    dispatcher: Arc<Dispatcher>,
    retry: RetryPolicy,
    sink: Arc<dyn ErrorSink>,
    poll_interval: Duration,
    lease_duration: Duration,
    delivery_timeout: Duration,
    concurrency: usize,
}

impl Poller {
    /// Create a poller.
    pub fn new(
        worker_id: impl Into<String>,
        locks: LockManager,
        dispatcher: Arc<Dispatcher>,
        retry: RetryPolicy,
        sink: Arc<dyn ErrorSink>,
        config: &WorkerConfig,
    ) -> Self {
        let lease_duration = locks.lease_duration().to_std().unwrap_or(Duration::ZERO);
        Self {
            worker_id: worker_id.into(),
            lease_duration,
            locks,
            dispatcher,
            retry,
            sink,
            poll_interval: config.poll_interval(),
            delivery_timeout: config.delivery_timeout(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Worker identifier used in logs.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Run until the shutdown signal flips to `true`.
    ///
    /// A tick in progress always finishes; its hooks are released before
    /// the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Poller '{}' started with batch_size={}, concurrency={}, poll_interval={:?}, lease={}s",
            self.worker_id,
            self.locks.batch_size(),
            self.concurrency,
            self.poll_interval,
            self.locks.lease_duration().num_seconds()
        );

        let mut interval = time::interval(self.poll_interval.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Poller '{}' received shutdown signal", self.worker_id);
                        break;
                    }
                }
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(summary) => {
                            // A full batch suggests more work is due right away.
                            if summary.claimed >= self.locks.batch_size() as usize {
                                interval.reset_immediately();
                            }
                        }
                        Err(e) => {
                            tracing::error!("Poller '{}' failed to claim hooks: {}", self.worker_id, e);
                        }
                    }
                }
            }
        }

        tracing::info!("Poller '{}' shut down complete", self.worker_id);
    }

    /// Run one tick at the current time.
    pub async fn tick(&self) -> AppResult<TickSummary> {
        self.tick_at(Utc::now()).await
    }

    /// Claim due hooks at `now` and process them with bounded concurrency.
    ///
    /// Only a failed claim is an error. Failures of individual hooks are
    /// resolved into their rows and counted in the summary.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> AppResult<TickSummary> {
        let claimed_at = Instant::now();
        let leased = self.locks.acquire(now).await?;
        let mut summary = TickSummary {
            claimed: leased.len(),
            ..TickSummary::default()
        };
        if leased.is_empty() {
            tracing::trace!("Poller '{}': no hooks due", self.worker_id);
            return Ok(summary);
        }

        let results: Vec<Processed> = stream::iter(leased)
            .map(|hook| self.process(hook, now, claimed_at))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        for processed in results {
            summary.record(processed);
        }

        tracing::info!(
            "Poller '{}' tick: claimed={}, completed={}, ignored={}, retried={}, failed={}, lost={}, errors={}",
            self.worker_id,
            summary.claimed,
            summary.completed,
            summary.ignored,
            summary.retried,
            summary.failed,
            summary.lost,
            summary.errors
        );
        Ok(summary)
    }

    async fn process(
        &self,
        leased: LeasedHook,
        now: DateTime<Utc>,
        claimed_at: Instant,
    ) -> Processed {
        let hook = &leased.hook;

        // A delivery must be able to finish inside the lease, otherwise another
        // worker could reclaim the hook while it is still being sent.
        let waited = claimed_at.elapsed();
        if waited + self.delivery_timeout >= self.lease_duration {
            tracing::warn!(
                "Poller '{}' skipping hook {}: waited {:?} in the batch, not enough lease left for a {:?} delivery",
                self.worker_id,
                hook.id,
                waited,
                self.delivery_timeout
            );
            return Processed::Lost;
        }

        let result = match time::timeout(self.delivery_timeout, self.dispatcher.dispatch(hook)).await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Transient(format!(
                "delivery timed out after {:?}",
                self.delivery_timeout
            ))),
        };

        let (resolution, report) = match result {
            Ok(DeliveryOutcome::Delivered(response)) => {
                (self.retry.on_success(hook, response), None)
            }
            Ok(DeliveryOutcome::Ignored(reason)) => {
                (self.retry.on_ignored(hook, &reason), None)
            }
            Err(error) => self.resolve_failure(&leased, error, now),
        };

        match self.locks.release(&leased, &resolution).await {
            Ok(ReleaseOutcome::Released) => {
                if let Some(report) = report {
                    self.sink.record(&report);
                }
                match resolution.status {
                    HookStatus::Completed => Processed::Completed,
                    HookStatus::Ignored => Processed::Ignored,
                    HookStatus::CompletelyFailed => Processed::Failed,
                    _ => Processed::Retried,
                }
            }
            Ok(ReleaseOutcome::Lost) => Processed::Lost,
            Err(e) => {
                tracing::error!(
                    "Failed to release hook {}: {}; it will be retried after its lease expires",
                    hook.id,
                    e
                );
                Processed::Error
            }
        }
    }

    fn resolve_failure(
        &self,
        leased: &LeasedHook,
        error: DeliveryError,
        now: DateTime<Utc>,
    ) -> (HookResolution, Option<ErrorReport>) {
        let hook = &leased.hook;
        let make_report = |severity: Severity, message: String, failed_count: i32| ErrorReport {
            hook_id: hook.id.get(),
            event_type: hook.event_type.clone(),
            failed_count,
            message,
            severity,
        };

        if !error.is_retryable() {
            let resolution = self.retry.on_permanent_failure(hook, &error);
            let report = match &error {
                DeliveryError::Configuration(msg) => {
                    tracing::error!("Hook {} cannot be dispatched: {}", hook.id, msg);
                    make_report(Severity::Critical, msg.clone(), resolution.failed_count)
                }
                _ => {
                    tracing::warn!("Hook {} failed permanently: {}", hook.id, error);
                    make_report(Severity::Error, error.to_string(), resolution.failed_count)
                }
            };
            return (resolution, Some(report));
        }

        let resolution = self.retry.on_transient_failure(hook, &error, now);
        if resolution.status == HookStatus::CompletelyFailed {
            tracing::warn!(
                "Hook {} exhausted {} attempt(s): {}",
                hook.id,
                resolution.failed_count,
                error
            );
            let message = format!(
                "retries exhausted after {} attempt(s): {}",
                resolution.failed_count, error
            );
            let report = make_report(Severity::Error, message, resolution.failed_count);
            (resolution, Some(report))
        } else {
            tracing::warn!(
                "Hook {} failed (attempt {}), next attempt at {}: {}",
                hook.id,
                resolution.failed_count,
                resolution
                    .execution_timestamp
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                error
            );
            (resolution, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_records_each_outcome() {
        let mut summary = TickSummary::default();
        for processed in [
            Processed::Completed,
            Processed::Completed,
            Processed::Ignored,
            Processed::Retried,
            Processed::Failed,
            Processed::Lost,
            Processed::Error,
        ] {
            summary.record(processed);
        }
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.retried, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.lost, 1);
        assert_eq!(summary.errors, 1);
    }
}
