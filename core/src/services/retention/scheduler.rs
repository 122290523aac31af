//! Safety-gated cleanup scheduler
//!
//! One background task wakes on a fixed interval and runs a cleanup cycle:
//! pre-flight, purge expired OTPs, optionally purge old logs, report. Cycles
//! never overlap; a timer tick or manual run that finds a cycle in progress
//! is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use og_shared::RetentionConfig;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::CleanupError;

use super::policy::RetentionPolicy;
use super::safety::run_preflight;
use super::traits::{ExpiredOtpSweeper, LogRetentionStore};
use super::types::{CleanupRunRecord, CycleOutcome, SchedulerStatus};

/// Scheduler timing configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Delay between `start()` and the first cycle
    pub initial_delay: StdDuration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_delay: StdDuration::from_secs(60),
        }
    }
}

impl From<&RetentionConfig> for SchedulerConfig {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            initial_delay: StdDuration::from_secs(config.initial_delay_seconds),
        }
    }
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Clears the in-progress flag when dropped, including on panic
struct CycleGuard(Arc<AtomicBool>);

impl CycleGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct SchedulerInner<S, L> {
    sweeper: Arc<S>,
    logs: Arc<L>,
    policy: Arc<RwLock<RetentionPolicy>>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    cycle_in_progress: Arc<AtomicBool>,
    last_run: RwLock<Option<CleanupRunRecord>>,
    next_run: RwLock<Option<DateTime<Utc>>>,
}

/// Periodic cleanup of expired OTPs and, optionally, old audit logs
pub struct CleanupScheduler<S, L>
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    inner: Arc<SchedulerInner<S, L>>,
    task: Mutex<Option<RunningTask>>,
}

impl<S, L> CleanupScheduler<S, L>
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    pub fn new(
        sweeper: Arc<S>,
        logs: Arc<L>,
        policy: Arc<RwLock<RetentionPolicy>>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                sweeper,
                logs,
                policy,
                clock,
                config,
                cycle_in_progress: Arc::new(AtomicBool::new(false)),
                last_run: RwLock::new(None),
                next_run: RwLock::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// Shared handle to the policy, for ops actions such as emergency disable
    pub fn policy(&self) -> Arc<RwLock<RetentionPolicy>> {
        self.inner.policy.clone()
    }

    /// Start the background timer. Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            warn!("Cleanup scheduler is already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let inner = self.inner.clone();
        let child = cancel.clone();
        let handle = tokio::spawn(async move { inner.run_loop(child).await });

        *task = Some(RunningTask { cancel, handle });
        true
    }

    /// Stop the background timer and wait for it to exit.
    ///
    /// A cycle already in flight is allowed to finish. Calling `stop` when not
    /// running is a no-op.
    pub async fn stop(&self) {
        let running = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(running) = running else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            error!(error = %e, "Cleanup scheduler task ended abnormally");
        }
        *self.inner.next_run.write().await = None;
        info!(event = "cleanup_scheduler_stopped", "Cleanup scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Run one cycle now. Requires `confirm = true`.
    ///
    /// # Errors
    ///
    /// * `ConfirmationRequired` - `confirm` was false
    /// * `CycleInProgress` - a cycle is already running
    /// * `SafetyVerificationFailed` - pre-flight failed and the cycle was aborted
    pub async fn run_once(&self, confirm: bool) -> Result<CleanupRunRecord, CleanupError> {
        if !confirm {
            warn!("Manual cleanup requires confirmation that only expired data should be removed");
            return Err(CleanupError::ConfirmationRequired);
        }

        info!(event = "cleanup_manual_trigger", "Manual cleanup triggered");
        let record = self
            .inner
            .clone()
            .run_guarded()
            .await
            .ok_or(CleanupError::CycleInProgress)?;

        if record.outcome == CycleOutcome::Aborted {
            let issues = record
                .preflight
                .as_ref()
                .map(|p| p.critical_messages())
                .unwrap_or_default();
            return Err(CleanupError::SafetyVerificationFailed { issues });
        }

        Ok(record)
    }

    pub async fn status(&self) -> SchedulerStatus {
        let policy = self.inner.policy.read().await;
        SchedulerStatus {
            is_running: self.is_running(),
            cycle_in_progress: self.inner.cycle_in_progress.load(Ordering::Acquire),
            next_run_estimate: *self.inner.next_run.read().await,
            interval_minutes: policy.interval_minutes(),
            policy_summary: policy.describe(),
            last_run: self.inner.last_run.read().await.clone(),
        }
    }

    pub async fn last_run(&self) -> Option<CleanupRunRecord> {
        self.inner.last_run.read().await.clone()
    }

    pub async fn describe(&self) -> String {
        self.inner.policy.read().await.describe()
    }

    /// Disable every deletion until `enable_safe_defaults` is called
    pub async fn emergency_disable_all(&self) {
        self.inner.policy.write().await.emergency_disable_all();
    }

    pub async fn enable_safe_defaults(&self) {
        self.inner.policy.write().await.enable_safe_defaults();
    }
}

impl<S, L> SchedulerInner<S, L>
where
    S: ExpiredOtpSweeper + 'static,
    L: LogRetentionStore + 'static,
{
    async fn run_loop(self: Arc<Self>, cancel: CancellationToken) {
        let (interval_minutes, summary) = {
            let policy = self.policy.read().await;
            (policy.interval_minutes(), policy.describe())
        };
        let period = StdDuration::from_secs(interval_minutes.max(1) * 60);

        info!(
            interval_minutes = interval_minutes,
            initial_delay_secs = self.config.initial_delay.as_secs(),
            policy = %summary,
            event = "cleanup_scheduler_started",
            "Cleanup scheduler started"
        );

        self.set_next_run(self.config.initial_delay).await;
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(self.config.initial_delay) => {}
        }

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.clone().run_guarded().await.is_none() {
                warn!(event = "cleanup_tick_skipped", "Previous cleanup cycle still running; skipping tick");
            }
            self.set_next_run(period).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
        }
    }

    async fn set_next_run(&self, after: StdDuration) {
        let after = Duration::from_std(after).unwrap_or_else(|_| Duration::zero());
        *self.next_run.write().await = Some(self.clock.now() + after);
    }

    /// Run one cycle unless another is in progress.
    ///
    /// The cycle and its guard live in a spawned task, so the in-progress flag
    /// clears only when the cycle itself ends, even if the caller is dropped.
    async fn run_guarded(self: Arc<Self>) -> Option<CleanupRunRecord> {
        let guard = CycleGuard::acquire(&self.cycle_in_progress)?;
        let started_at = self.clock.now();

        let supervised = {
            let inner = self.clone();
            tokio::spawn(async move {
                let record = inner.run_contained(started_at).await;
                drop(guard);
                record
            })
        };

        match supervised.await {
            Ok(record) => Some(record),
            Err(e) => {
                error!(error = %e, event = "cleanup_cycle_panicked", "Cleanup cycle task ended abnormally");
                Some(Self::failed_record(started_at, e.to_string()))
            }
        }
    }

    /// Run the cycle in its own task so a panic inside it is recorded as a failed run
    async fn run_contained(self: Arc<Self>, started_at: DateTime<Utc>) -> CleanupRunRecord {
        let cycle = {
            let inner = self.clone();
            tokio::spawn(async move { inner.run_cycle(started_at).await })
        };

        let record = match cycle.await {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, event = "cleanup_cycle_panicked", "Cleanup cycle failed unexpectedly");
                Self::failed_record(started_at, e.to_string())
            }
        };

        *self.last_run.write().await = Some(record.clone());
        record
    }

    fn failed_record(started_at: DateTime<Utc>, message: String) -> CleanupRunRecord {
        CleanupRunRecord {
            run_id: Uuid::new_v4(),
            started_at,
            duration_ms: 0,
            otps_deleted: 0,
            logs_deleted: 0,
            preflight: None,
            outcome: CycleOutcome::Failed { message },
        }
    }

    async fn run_cycle(&self, started_at: DateTime<Utc>) -> CleanupRunRecord {
        let run_id = Uuid::new_v4();
        let timer = std::time::Instant::now();
        let snapshot = self.policy.read().await.snapshot();

        info!(run_id = %run_id, "Starting cleanup cycle (expired data only)");

        let mut record = CleanupRunRecord {
            run_id,
            started_at,
            duration_ms: 0,
            otps_deleted: 0,
            logs_deleted: 0,
            preflight: None,
            outcome: CycleOutcome::Completed,
        };

        let preflight = run_preflight(&snapshot, self.sweeper.as_ref(), started_at).await;
        let passed = preflight.passed;
        record.preflight = Some(preflight);

        record.outcome = if !passed {
            CycleOutcome::Aborted
        } else if !snapshot.any_deletion_enabled() {
            CycleOutcome::Skipped {
                reason: "all cleanup disabled by policy".to_string(),
            }
        } else {
            let mut failures = Vec::new();

            if snapshot.clean_expired_otps {
                match self.sweeper.purge_expired().await {
                    Ok(count) => record.otps_deleted = count,
                    Err(e) => failures.push(format!("expired OTP cleanup failed: {}", e)),
                }
            }

            if snapshot.clean_old_logs {
                let cutoff = started_at - Duration::days(snapshot.log_retention_days);
                match self.logs.delete_logs_older_than(cutoff).await {
                    Ok(count) => record.logs_deleted = count,
                    Err(e) => failures.push(format!("log cleanup failed: {}", e)),
                }
            }

            if failures.is_empty() {
                CycleOutcome::Completed
            } else {
                CycleOutcome::Failed {
                    message: failures.join("; "),
                }
            }
        };

        record.duration_ms = timer.elapsed().as_millis() as u64;

        match &record.outcome {
            CycleOutcome::Completed => info!(
                run_id = %run_id,
                otps_deleted = record.otps_deleted,
                logs_deleted = record.logs_deleted,
                duration_ms = record.duration_ms,
                event = "cleanup_cycle_completed",
                "Cleanup cycle completed"
            ),
            CycleOutcome::Aborted => error!(
                run_id = %run_id,
                event = "cleanup_cycle_aborted",
                "Cleanup cycle aborted by pre-flight verification; nothing deleted"
            ),
            CycleOutcome::Failed { message } => error!(
                run_id = %run_id,
                error = %message,
                otps_deleted = record.otps_deleted,
                logs_deleted = record.logs_deleted,
                event = "cleanup_cycle_failed",
                "Cleanup cycle failed; will retry next interval"
            ),
            CycleOutcome::Skipped { reason } => info!(
                run_id = %run_id,
                reason = %reason,
                event = "cleanup_cycle_skipped",
                "Cleanup cycle skipped"
            ),
        }

        record
    }
}
