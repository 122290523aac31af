//! Unit tests for the OTP lifecycle

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use og_shared::{Environment, TestAccountConfig};

use crate::clock::{Clock, ManualClock};
use crate::domain::entities::{IdentifierType, OtpKey, OtpPurpose, OtpState};
use crate::errors::{DomainError, OtpError};
use crate::repositories::MockOtpRepository;
use crate::services::otp::{OtpService, OtpServiceConfig, TestAccountPolicy};

struct Harness {
    service: OtpService<MockOtpRepository>,
    repo: Arc<MockOtpRepository>,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    harness_with(OtpServiceConfig::default(), TestAccountPolicy::disabled())
}

fn harness_with(config: OtpServiceConfig, test_accounts: TestAccountPolicy) -> Harness {
    let repo = Arc::new(MockOtpRepository::new());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
    let service = OtpService::new(repo.clone(), clock.clone(), config, test_accounts);
    Harness { service, repo, clock }
}

fn email_key() -> OtpKey {
    OtpKey::new("user@example.com", IdentifierType::Email, OtpPurpose::Login)
}

#[tokio::test]
async fn test_issue_creates_active_record() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();

    assert_eq!(record.otp.len(), 4);
    assert_eq!(record.attempts, 0);
    assert_eq!(record.max_attempts, 3);
    assert_eq!(record.expires_at, h.clock.now() + Duration::minutes(10));
    assert_eq!(record.session_token.as_ref().map(String::len), Some(64));

    let active = h.service.find_active(&email_key(), None).await.unwrap();
    assert_eq!(active.map(|r| r.id), Some(record.id));
}

#[tokio::test]
async fn test_issue_rejects_empty_identifier() {
    let h = harness();
    let key = OtpKey::new("  ", IdentifierType::Email, OtpPurpose::Login);

    let result = h.service.issue(&key).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
}

#[tokio::test]
async fn test_issue_supersedes_previous_active_record() {
    let h = harness();
    let first = h.service.issue(&email_key()).await.unwrap();
    h.clock.advance(Duration::seconds(5));
    let second = h.service.issue(&email_key()).await.unwrap();

    let active = h.repo.active_for(&email_key(), h.clock.now()).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.id);

    let superseded = h.repo.all().await.into_iter().find(|r| r.id == first.id).unwrap();
    assert!(superseded.is_used);
    assert!(superseded.used_at.is_none());
}

#[tokio::test]
async fn test_find_active_filters_by_session_token() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();
    let token = record.session_token.clone().unwrap();

    let found = h.service.find_active(&email_key(), Some(&token)).await.unwrap();
    assert_eq!(found.map(|r| r.id), Some(record.id));

    let missing = h.service.find_active(&email_key(), Some("not-a-token")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_resend_within_expiry_reuses_code_and_session() {
    let h = harness();
    let first = h.service.resend(&email_key()).await.unwrap();
    assert!(first.is_new);

    h.clock.advance(Duration::minutes(1));
    let second = h.service.resend(&email_key()).await.unwrap();

    assert!(!second.is_new);
    assert_eq!(second.code, first.code);
    assert_eq!(second.session_token, first.session_token);
    assert_eq!(second.expires_at, first.expires_at);
    assert_eq!(h.repo.all().await.len(), 1);
}

#[tokio::test]
async fn test_resend_after_expiry_issues_new_code() {
    let h = harness();
    let first = h.service.resend(&email_key()).await.unwrap();

    h.clock.advance(Duration::minutes(11));
    let second = h.service.resend(&email_key()).await.unwrap();

    assert!(second.is_new);
    assert_ne!(second.session_token, first.session_token);
    assert_ne!(second.record_id, first.record_id);
    assert_eq!(h.repo.active_for(&email_key(), h.clock.now()).await.len(), 1);
}

#[tokio::test]
async fn test_at_most_one_active_after_mixed_sequence() {
    let h = harness();
    for step in 0..6 {
        if step % 2 == 0 {
            h.service.issue(&email_key()).await.unwrap();
        } else {
            h.service.resend(&email_key()).await.unwrap();
        }
        h.clock.advance(Duration::minutes(4));
        let active = h.repo.active_for(&email_key(), h.clock.now()).await;
        assert!(active.len() <= 1, "step {} left {} active records", step, active.len());
    }
}

#[tokio::test]
async fn test_concurrent_resends_create_single_record() {
    let h = harness();
    let service = Arc::new(h.service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.resend(&email_key()).await.unwrap() }));
    }

    let mut tokens = HashSet::new();
    let mut created = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        tokens.insert(result.session_token);
        if result.is_new {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(tokens.len(), 1);
    assert_eq!(h.repo.all().await.len(), 1);
}

#[tokio::test]
async fn test_verify_correct_code_consumes_record() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();

    let outcome = h.service.verify(&record, &record.otp).await.unwrap();
    assert!(outcome.valid);

    let stored = h.repo.all().await.pop().unwrap();
    assert_eq!(stored.state(h.clock.now()), OtpState::Verified);
    assert!(stored.used_at.is_some());
    assert!(h.service.find_active(&email_key(), None).await.unwrap().is_none());

    let again = h.service.verify(&record, &record.otp).await;
    assert!(matches!(again, Err(DomainError::Otp(OtpError::AlreadyUsed))));
}

#[tokio::test]
async fn test_verify_wrong_code_counts_down_then_locks() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();
    let wrong = if record.otp == "0000" { "1111" } else { "0000" };

    for expected_left in [2, 1, 0] {
        let outcome = h.service.verify(&record, wrong).await.unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.attempts_left, expected_left);
    }

    let locked = h.service.verify(&record, &record.otp).await;
    assert!(matches!(
        locked,
        Err(DomainError::Otp(OtpError::AttemptsExceeded { max_attempts: 3 }))
    ));

    let stored = h.repo.all().await.pop().unwrap();
    assert_eq!(stored.attempts, 3);
    assert!(!stored.is_used);
}

#[tokio::test]
async fn test_locked_record_is_kept_and_resend_reports_lock() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();
    for _ in 0..3 {
        let _ = h.service.verify(&record, "wrong").await.unwrap();
    }

    let resent = h.service.resend(&email_key()).await;
    assert!(matches!(
        resent,
        Err(DomainError::Otp(OtpError::AttemptsExceeded { max_attempts: 3 }))
    ));

    assert_eq!(h.service.purge_expired().await.unwrap(), 0);
    assert_eq!(h.repo.all().await.len(), 1);
}

#[tokio::test]
async fn test_issue_replaces_locked_record() {
    let h = harness();
    let locked = h.service.issue(&email_key()).await.unwrap();
    for _ in 0..3 {
        let _ = h.service.verify(&locked, "wrong").await.unwrap();
    }

    let fresh = h.service.issue(&email_key()).await.unwrap();
    let outcome = h.service.verify(&fresh, &fresh.otp).await.unwrap();
    assert!(outcome.valid);

    let resent = h.service.resend(&email_key()).await.unwrap();
    assert!(resent.is_new);
}

#[tokio::test]
async fn test_verify_expired_record() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();

    h.clock.advance(Duration::minutes(10));
    let result = h.service.verify(&record, &record.otp).await;
    assert!(matches!(result, Err(DomainError::Otp(OtpError::Expired))));
}

#[tokio::test]
async fn test_concurrent_correct_verifications_consume_once() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();
    let service = Arc::new(h.service);

    let a = {
        let (service, record) = (service.clone(), record.clone());
        tokio::spawn(async move { service.verify(&record, &record.otp).await })
    };
    let b = {
        let (service, record) = (service.clone(), record.clone());
        tokio::spawn(async move { service.verify(&record, &record.otp).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let consumed = results.iter().filter(|r| matches!(r, Ok(o) if o.valid)).count();
    let used = results
        .iter()
        .filter(|r| matches!(r, Err(DomainError::Otp(OtpError::AlreadyUsed))))
        .count();
    assert_eq!((consumed, used), (1, 1));
}

#[tokio::test]
async fn test_mark_used_is_terminal() {
    let h = harness();
    let record = h.service.issue(&email_key()).await.unwrap();

    let used = h.service.mark_used(&record).await.unwrap();
    assert!(used.is_used);

    let again = h.service.mark_used(&record).await;
    assert!(matches!(again, Err(DomainError::Otp(OtpError::AlreadyUsed))));
    assert!(h.service.find_active(&email_key(), None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_deletes_only_strictly_expired() {
    let h = harness();
    let old = h.service.issue(&email_key()).await.unwrap();
    let mobile = OtpKey::new("1234567899", IdentifierType::Mobile, OtpPurpose::Login);

    h.clock.advance(Duration::minutes(5));
    let fresh = h.service.issue(&mobile).await.unwrap();

    // exactly at old.expires_at: nothing is strictly past expiry yet
    h.clock.set(old.expires_at);
    assert_eq!(h.service.purge_expired().await.unwrap(), 0);

    h.clock.advance(Duration::seconds(1));
    assert_eq!(h.service.purge_expired().await.unwrap(), 1);

    let remaining: Vec<_> = h.repo.all().await.into_iter().map(|r| r.id).collect();
    assert_eq!(remaining, vec![fresh.id]);
}

#[tokio::test]
async fn test_expired_then_purged_then_resend_issues_fresh_code() {
    let h = harness();
    let first = h.service.resend(&email_key()).await.unwrap();

    h.clock.advance(Duration::minutes(11));
    assert_eq!(h.service.purge_expired().await.unwrap(), 1);
    assert!(h.repo.all().await.is_empty());

    let second = h.service.resend(&email_key()).await.unwrap();
    assert!(second.is_new);
    assert_ne!(second.session_token, first.session_token);
}

#[tokio::test]
async fn test_request_limit() {
    let config = OtpServiceConfig {
        request_limit: 2,
        ..OtpServiceConfig::default()
    };
    let h = harness_with(config, TestAccountPolicy::disabled());

    h.service.check_request_limit(&email_key()).await.unwrap();
    h.service.issue(&email_key()).await.unwrap();
    h.service.issue(&email_key()).await.unwrap();

    let limited = h.service.check_request_limit(&email_key()).await;
    assert!(matches!(
        limited,
        Err(DomainError::Otp(OtpError::RequestLimitReached { window_minutes: 30 }))
    ));

    h.clock.advance(Duration::minutes(31));
    assert!(h.service.check_request_limit(&email_key()).await.is_ok());
}

#[tokio::test]
async fn test_test_account_receives_fixed_code() {
    let accounts = TestAccountConfig {
        enabled: true,
        identifiers: vec!["abc@gmail.com".to_string()],
        ..TestAccountConfig::default()
    };
    let policy = TestAccountPolicy::new(&accounts, Environment::Development);
    let h = harness_with(OtpServiceConfig::default(), policy);

    let key = OtpKey::new("abc@gmail.com", IdentifierType::Email, OtpPurpose::Login);
    let record = h.service.issue(&key).await.unwrap();
    assert_eq!(record.otp, "1234");

    let other = h.service.issue(&email_key()).await.unwrap();
    assert_eq!(other.otp.len(), 4);
}
