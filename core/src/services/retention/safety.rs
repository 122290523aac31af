//! Pre-flight safety verification, run before every cleanup cycle

use chrono::{DateTime, Utc};

use super::traits::ExpiredOtpSweeper;
use super::types::{PolicySnapshot, PreflightReport, SafetyIssue, Severity};

/// Verify that a cycle under `snapshot` is safe to run.
///
/// Pinned flags reading `true` or a failure to count OTP rows are critical and
/// fail the report. A large expired backlog is a warning only.
pub async fn run_preflight<S: ExpiredOtpSweeper + ?Sized>(
    snapshot: &PolicySnapshot,
    sweeper: &S,
    now: DateTime<Utc>,
) -> PreflightReport {
    let mut issues = Vec::new();
    let mut expired_count = None;
    let mut valid_count = None;

    if snapshot.clean_user_accounts {
        issues.push(SafetyIssue::critical(
            "user account cleanup is enabled; this would delete user data",
        ));
    }
    if snapshot.clean_valid_otps {
        issues.push(SafetyIssue::critical(
            "valid OTP cleanup is enabled; this would delete active OTPs",
        ));
    }

    if snapshot.clean_expired_otps {
        match (sweeper.count_expired().await, sweeper.count_valid().await) {
            (Ok(expired), Ok(valid)) => {
                tracing::info!(
                    expired = expired,
                    valid = valid,
                    "Safety check: expired OTPs to clean, valid OTPs protected"
                );
                if expired > snapshot.expired_warning_threshold {
                    issues.push(SafetyIssue::warning(format!(
                        "large number of expired OTPs ({}); consider manual review",
                        expired
                    )));
                }
                expired_count = Some(expired);
                valid_count = Some(valid);
            }
            (Err(e), _) | (_, Err(e)) => {
                issues.push(SafetyIssue::critical(format!(
                    "could not count OTP records: {}",
                    e
                )));
            }
        }
    }

    let report = PreflightReport {
        passed: issues.iter().all(|i| i.severity != Severity::Critical),
        issues,
        expired_count,
        valid_count,
        checked_at: now,
    };

    if report.passed {
        for warning in report.warnings() {
            tracing::warn!(issue = %warning.message, "Pre-flight warning");
        }
        tracing::info!(event = "preflight_passed", "Pre-flight safety verification passed");
    } else {
        tracing::error!(
            event = "preflight_failed",
            issues = ?report.critical_messages(),
            "Pre-flight safety verification failed; cycle will be aborted"
        );
    }

    report
}
