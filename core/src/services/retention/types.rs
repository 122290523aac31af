//! Types shared by the retention policy, pre-flight and scheduler

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Point-in-time copy of the retention policy, read once per cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySnapshot {
    pub clean_expired_otps: bool,
    pub clean_user_accounts: bool,
    pub clean_valid_otps: bool,
    pub clean_old_logs: bool,
    pub interval_minutes: u64,
    pub log_retention_days: i64,
    pub expired_warning_threshold: u64,
}

impl PolicySnapshot {
    /// Whether the cycle has anything to delete
    pub fn any_deletion_enabled(&self) -> bool {
        self.clean_expired_otps || self.clean_old_logs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Aborts the cycle
    Critical,
    /// Reported, cycle proceeds
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyIssue {
    pub severity: Severity,
    pub message: String,
}

impl SafetyIssue {
    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Critical,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Outcome of pre-flight verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    /// False if any critical issue was found
    pub passed: bool,
    pub issues: Vec<SafetyIssue>,
    /// `None` when OTP cleanup is disabled or counting failed
    pub expired_count: Option<u64>,
    pub valid_count: Option<u64>,
    pub checked_at: DateTime<Utc>,
}

impl PreflightReport {
    pub fn critical_messages(&self) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .map(|i| i.message.clone())
            .collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SafetyIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed,
    /// Pre-flight failed; nothing was deleted
    Aborted,
    /// A deletion step errored or the cycle panicked
    Failed { message: String },
    /// Nothing to do under the current policy
    Skipped { reason: String },
}

/// In-memory record of one cleanup cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupRunRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub otps_deleted: u64,
    pub logs_deleted: u64,
    pub preflight: Option<PreflightReport>,
    pub outcome: CycleOutcome,
}

/// Scheduler state for ops tooling
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub cycle_in_progress: bool,
    pub next_run_estimate: Option<DateTime<Utc>>,
    pub interval_minutes: u64,
    pub policy_summary: String,
    pub last_run: Option<CleanupRunRecord>,
}
