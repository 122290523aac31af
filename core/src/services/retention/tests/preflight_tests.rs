//! Unit tests for pre-flight safety verification

use std::sync::Arc;

use chrono::Utc;
use og_shared::RetentionConfig;

use crate::clock::SystemClock;
use crate::repositories::MockOtpRepository;
use crate::services::otp::{OtpService, OtpServiceConfig, TestAccountPolicy};
use crate::services::retention::{run_preflight, RetentionPolicy, Severity};

use super::mocks::ScriptedSweeper;

#[tokio::test]
async fn test_default_policy_passes_and_reports_counts() {
    let sweeper = ScriptedSweeper::with_counts(12, 3);
    let snapshot = RetentionPolicy::default().snapshot();

    let report = run_preflight(&snapshot, &sweeper, Utc::now()).await;

    assert!(report.passed);
    assert!(report.issues.is_empty());
    assert_eq!(report.expired_count, Some(12));
    assert_eq!(report.valid_count, Some(3));
}

#[tokio::test]
async fn test_large_backlog_is_a_warning_not_a_failure() {
    let sweeper = ScriptedSweeper::with_counts(10_001, 0);
    let snapshot = RetentionPolicy::default().snapshot();

    let report = run_preflight(&snapshot, &sweeper, Utc::now()).await;

    assert!(report.passed);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::Warning);
    assert!(report.issues[0].message.contains("10001"));
}

#[tokio::test]
async fn test_backlog_at_threshold_is_not_flagged() {
    let sweeper = ScriptedSweeper::with_counts(10_000, 0);
    let report = run_preflight(&RetentionPolicy::default().snapshot(), &sweeper, Utc::now()).await;
    assert!(report.issues.is_empty());
}

#[tokio::test]
async fn test_pinned_flags_forced_on_fail_preflight() {
    let sweeper = ScriptedSweeper::with_counts(1, 1);
    let mut policy = RetentionPolicy::default();
    policy.force_unsafe_flags();

    let report = run_preflight(&policy.snapshot(), &sweeper, Utc::now()).await;

    assert!(!report.passed);
    assert_eq!(report.critical_messages().len(), 2);
}

#[tokio::test]
async fn test_count_failure_is_critical() {
    let repo = MockOtpRepository::new();
    repo.set_fail_counts(true);
    let service = OtpService::new(
        Arc::new(repo),
        Arc::new(SystemClock),
        OtpServiceConfig::default(),
        TestAccountPolicy::disabled(),
    );

    let report = run_preflight(&RetentionPolicy::default().snapshot(), &service, Utc::now()).await;

    assert!(!report.passed);
    assert!(report.critical_messages()[0].contains("could not count"));
    assert_eq!(report.expired_count, None);
}

#[tokio::test]
async fn test_counts_skipped_when_otp_cleanup_disabled() {
    let sweeper = ScriptedSweeper::with_counts(50_000, 0);
    let policy = RetentionPolicy::from_config(&RetentionConfig {
        clean_expired_otps: false,
        ..RetentionConfig::default()
    });

    let report = run_preflight(&policy.snapshot(), &sweeper, Utc::now()).await;

    assert!(report.passed);
    assert!(report.issues.is_empty());
    assert_eq!(report.expired_count, None);
}
