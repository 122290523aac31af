//! Unit tests for the authentication service

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use og_shared::{Environment, TestAccountConfig};

use crate::clock::{Clock, ManualClock};
use crate::domain::entities::{AuditEventType, IdentifierType, OtpKey, OtpPurpose};
use crate::errors::{DomainError, OtpError};
use crate::repositories::{
    MockAuditLogRepository, MockOtpRepository, MockUserRepository, OtpRepository, UserRepository,
};
use crate::services::audit::AuditService;
use crate::services::auth::{AuthService, AuthServiceConfig};
use crate::services::otp::{OtpService, OtpServiceConfig, TestAccountPolicy};
use crate::services::token::{TokenService, TokenServiceConfig};

use super::mocks::MockDelivery;

type TestAuthService =
    AuthService<MockUserRepository, MockOtpRepository, MockAuditLogRepository, MockDelivery>;

struct Harness {
    service: TestAuthService,
    users: Arc<MockUserRepository>,
    otps: Arc<MockOtpRepository>,
    audit: Arc<MockAuditLogRepository>,
    delivery: Arc<MockDelivery>,
    clock: Arc<ManualClock>,
    tokens: Arc<TokenService>,
}

fn harness() -> Harness {
    harness_with(TestAccountPolicy::disabled())
}

fn harness_with(test_accounts: TestAccountPolicy) -> Harness {
    let users = Arc::new(MockUserRepository::new());
    let otps = Arc::new(MockOtpRepository::new());
    let audit = Arc::new(MockAuditLogRepository::new());
    let delivery = Arc::new(MockDelivery::new());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
    let tokens = Arc::new(TokenService::new(TokenServiceConfig::default()));

    let otp_service = Arc::new(OtpService::new(
        otps.clone(),
        clock.clone(),
        OtpServiceConfig::default(),
        test_accounts,
    ));
    let audit_service = Arc::new(AuditService::new(audit.clone(), clock.clone()));

    let service = AuthService::new(
        users.clone(),
        otp_service,
        tokens.clone(),
        audit_service,
        delivery.clone(),
        clock.clone(),
        AuthServiceConfig::default(),
    );

    Harness {
        service,
        users,
        otps,
        audit,
        delivery,
        clock,
        tokens,
    }
}

#[tokio::test]
async fn test_initiate_login_creates_user_and_delivers_code() {
    let h = harness();

    let challenge = h.service.initiate_login("User@Example.com", None).await.unwrap();

    assert!(challenge.is_new);
    assert_eq!(challenge.identifier_type, IdentifierType::Email);
    assert_eq!(challenge.sent_to, "u***@example.com");
    assert_eq!(challenge.expires_at, h.clock.now() + Duration::minutes(10));

    let user = h
        .users
        .find_by_identifier("user@example.com", IdentifierType::Email)
        .await
        .unwrap()
        .unwrap();
    assert!(user.is_active);
    assert!(h.delivery.last_code("user@example.com").is_some());
}

#[tokio::test]
async fn test_initiate_login_mobile_gets_default_country_code() {
    let h = harness();
    h.service.initiate_login("98765 43210", None).await.unwrap();

    let user = h
        .users
        .find_by_identifier("9876543210", IdentifierType::Mobile)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.country_code.as_deref(), Some("+91"));
}

#[tokio::test]
async fn test_initiate_login_rejects_invalid_identifier() {
    let h = harness();
    let result = h.service.initiate_login("not an identifier", None).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert_eq!(h.users.count().await, 0);
}

#[tokio::test]
async fn test_full_login_flow() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();

    let session = h
        .service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await
        .unwrap();

    assert!(session.first_login);
    assert_eq!(session.expires_in, 24 * 3600);
    let claims = h.tokens.verify(&session.access_token).unwrap();
    assert_eq!(claims.user_id().unwrap(), session.user_id);

    let user = h
        .users
        .find_by_identifier("user@example.com", IdentifierType::Email)
        .await
        .unwrap()
        .unwrap();
    assert!(user.is_email_verified);
    assert_eq!(user.last_login_at, Some(h.clock.now()));

    let events: Vec<_> = h.audit.get_all_logs().await.into_iter().map(|l| l.event_type).collect();
    assert!(events.contains(&AuditEventType::SendCodeSuccess));
    assert!(events.contains(&AuditEventType::LoginSuccess));
}

#[tokio::test]
async fn test_profile_of_logged_in_user() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();
    let session = h
        .service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await
        .unwrap();

    let user = h.service.profile(session.user_id).await.unwrap();
    assert_eq!(user.email.as_deref(), Some("user@example.com"));
    assert_eq!(user.last_login_at, Some(h.clock.now()));

    let missing = h.service.profile(uuid::Uuid::new_v4()).await;
    assert!(matches!(missing, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_second_login_is_not_first() {
    let h = harness();
    for expected_first in [true, false] {
        let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
        let code = h.delivery.last_code("user@example.com").unwrap();
        let session = h
            .service
            .verify_and_login("user@example.com", &challenge.session_token, &code)
            .await
            .unwrap();
        assert_eq!(session.first_login, expected_first);
    }
}

#[tokio::test]
async fn test_wrong_code_reports_attempts_left_then_locks() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();
    let wrong = if code == "0000" { "1111" } else { "0000" };

    for expected in [2, 1, 0] {
        let result = h
            .service
            .verify_and_login("user@example.com", &challenge.session_token, wrong)
            .await;
        match result {
            Err(DomainError::Otp(OtpError::InvalidCode { attempts_left })) => {
                assert_eq!(attempts_left, expected)
            }
            other => panic!("expected invalid code, got {:?}", other),
        }
    }

    let locked = h
        .service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await;
    assert!(matches!(
        locked,
        Err(DomainError::Otp(OtpError::AttemptsExceeded { .. }))
    ));

    let events: Vec<_> = h.audit.get_all_logs().await.into_iter().map(|l| l.event_type).collect();
    assert!(events.contains(&AuditEventType::AttemptsExceeded));
}

#[tokio::test]
async fn test_verify_with_unknown_session_is_not_found() {
    let h = harness();
    h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();

    let result = h
        .service
        .verify_and_login("user@example.com", "bogus-session", &code)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_verify_after_expiry_reports_expired() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();

    h.clock.advance(Duration::minutes(10));
    let result = h
        .service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await;
    assert!(matches!(result, Err(DomainError::Otp(OtpError::Expired))));
}

#[tokio::test]
async fn test_verify_after_purge_is_not_found() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();

    h.clock.advance(Duration::minutes(11));
    assert_eq!(h.otps.delete_expired(h.clock.now()).await.unwrap(), 1);

    let result = h
        .service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_verify_reused_session_reports_already_used() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();

    h.service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await
        .unwrap();
    let again = h
        .service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await;
    assert!(matches!(again, Err(DomainError::Otp(OtpError::AlreadyUsed))));
}

#[tokio::test]
async fn test_verify_locked_code_after_expiry_reports_attempts_exceeded() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();
    let wrong = if code == "0000" { "1111" } else { "0000" };

    for _ in 0..3 {
        let _ = h
            .service
            .verify_and_login("user@example.com", &challenge.session_token, wrong)
            .await;
    }
    h.clock.advance(Duration::minutes(11));

    let result = h
        .service
        .verify_and_login("user@example.com", &challenge.session_token, &code)
        .await;
    assert!(matches!(
        result,
        Err(DomainError::Otp(OtpError::AttemptsExceeded { max_attempts: 3 }))
    ));
}

#[tokio::test]
async fn test_resend_of_locked_code_is_refused_and_login_recovers() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let code = h.delivery.last_code("user@example.com").unwrap();
    let wrong = if code == "0000" { "1111" } else { "0000" };
    for _ in 0..3 {
        let _ = h
            .service
            .verify_and_login("user@example.com", &challenge.session_token, wrong)
            .await;
    }
    let sends_before = h.delivery.send_count("user@example.com");

    let resent = h.service.resend_otp("user@example.com").await;
    assert!(matches!(
        resent,
        Err(DomainError::Otp(OtpError::AttemptsExceeded { .. }))
    ));
    assert_eq!(h.delivery.send_count("user@example.com"), sends_before);

    let fresh = h.service.initiate_login("user@example.com", None).await.unwrap();
    let fresh_code = h.delivery.last_code("user@example.com").unwrap();
    h.service
        .verify_and_login("user@example.com", &fresh.session_token, &fresh_code)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_resend_requires_existing_user() {
    let h = harness();
    let result = h.service.resend_otp("ghost@example.com").await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_resend_reuses_active_code() {
    let h = harness();
    let challenge = h.service.initiate_login("user@example.com", None).await.unwrap();
    let first_code = h.delivery.last_code("user@example.com").unwrap();

    h.clock.advance(Duration::minutes(2));
    let resent = h.service.resend_otp("user@example.com").await.unwrap();

    assert!(!resent.is_new);
    assert_eq!(resent.session_token, challenge.session_token);
    assert_eq!(h.delivery.last_code("user@example.com"), Some(first_code));
    assert_eq!(h.delivery.send_count("user@example.com"), 2);
}

#[tokio::test]
async fn test_delivery_failure_keeps_record_and_resend_recovers() {
    let h = harness();
    h.service.initiate_login("user@example.com", None).await.unwrap();
    h.delivery.set_should_fail(true);

    // a second login supersedes the first code, then fails to deliver
    let result = h.service.initiate_login("user@example.com", None).await;
    assert!(matches!(
        result,
        Err(DomainError::Otp(OtpError::DeliveryFailed { .. }))
    ));
    let key = OtpKey::new("user@example.com", IdentifierType::Email, OtpPurpose::Login);
    assert_eq!(h.otps.active_for(&key, h.clock.now()).await.len(), 1);

    h.delivery.set_should_fail(false);
    let resent = h.service.resend_otp("user@example.com").await.unwrap();
    assert!(!resent.is_new);
    let code = h.delivery.last_code("user@example.com").unwrap();
    h.service
        .verify_and_login("user@example.com", &resent.session_token, &code)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_request_limit_blocks_new_logins() {
    let h = harness();
    for _ in 0..5 {
        h.service.initiate_login("user@example.com", None).await.unwrap();
    }

    let limited = h.service.initiate_login("user@example.com", None).await;
    assert!(matches!(
        limited,
        Err(DomainError::Otp(OtpError::RequestLimitReached { .. }))
    ));

    // reusing the active code is still allowed
    let resent = h.service.resend_otp("user@example.com").await.unwrap();
    assert!(!resent.is_new);
}

#[tokio::test]
async fn test_test_account_skips_delivery_and_uses_fixed_code() {
    let accounts = TestAccountConfig {
        enabled: true,
        identifiers: vec!["1234567899".to_string()],
        ..TestAccountConfig::default()
    };
    let h = harness_with(TestAccountPolicy::new(&accounts, Environment::Staging));

    let challenge = h.service.initiate_login("1234567899", Some("+1")).await.unwrap();
    assert_eq!(h.delivery.send_count("1234567899"), 0);

    let session = h
        .service
        .verify_and_login("1234567899", &challenge.session_token, "1234")
        .await
        .unwrap();
    assert_eq!(session.identifier_type, IdentifierType::Mobile);
}
