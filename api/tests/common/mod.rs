//! Shared fixtures for the HTTP tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::RwLock;

use og_api::routes::{AuthState, OpsState};
use og_core::clock::ManualClock;
use og_core::domain::entities::{IdentifierType, OtpKey, OtpPurpose, OtpRecord};
use og_core::domain::value_objects::Identifier;
use og_core::repositories::{MockAuditLogRepository, MockOtpRepository, MockUserRepository};
use og_core::services::{
    AuditService, AuthService, AuthServiceConfig, CleanupScheduler, OtpDelivery, OtpService,
    OtpServiceConfig, RetentionPolicy, SchedulerConfig, TestAccountPolicy, TokenService,
    TokenServiceConfig,
};
use og_shared::RetentionConfig;

pub type TestOtpService = OtpService<MockOtpRepository>;
pub type TestAuthState =
    AuthState<MockUserRepository, MockOtpRepository, MockAuditLogRepository, RecordingDelivery>;
pub type TestOpsState = OpsState<TestOtpService, MockAuditLogRepository>;

/// Delivery that remembers the last code per identifier
#[derive(Default)]
pub struct RecordingDelivery {
    codes: Mutex<HashMap<String, String>>,
}

impl RecordingDelivery {
    pub fn last_code(&self, identifier: &str) -> Option<String> {
        self.codes.lock().unwrap().get(identifier).cloned()
    }
}

#[async_trait]
impl OtpDelivery for RecordingDelivery {
    async fn send_code(
        &self,
        identifier: &Identifier,
        code: &str,
        _country_code: Option<&str>,
    ) -> Result<String, String> {
        self.codes
            .lock()
            .unwrap()
            .insert(identifier.as_str().to_string(), code.to_string());
        Ok("test-message".to_string())
    }
}

pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub otps: Arc<MockOtpRepository>,
    pub audit: Arc<MockAuditLogRepository>,
    pub delivery: Arc<RecordingDelivery>,
    pub auth_state: web::Data<TestAuthState>,
    pub ops_state: web::Data<TestOpsState>,
}

pub const OPERATOR_TOKEN: &str = "test-operator-token";

pub fn operator_header() -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", OPERATOR_TOKEN))
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

pub fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(start_time()));
    let otps = Arc::new(MockOtpRepository::new());
    let users = Arc::new(MockUserRepository::new());
    let audit = Arc::new(MockAuditLogRepository::new());
    let delivery = Arc::new(RecordingDelivery::default());

    let otp_service = Arc::new(OtpService::new(
        otps.clone(),
        clock.clone(),
        OtpServiceConfig::default(),
        TestAccountPolicy::disabled(),
    ));
    let auth_service = Arc::new(AuthService::new(
        users,
        otp_service.clone(),
        Arc::new(TokenService::new(TokenServiceConfig::default())),
        Arc::new(AuditService::new(audit.clone(), clock.clone())),
        delivery.clone(),
        clock.clone(),
        AuthServiceConfig::default(),
    ));

    let policy = RetentionPolicy::from_config(&RetentionConfig::default());
    let scheduler = Arc::new(CleanupScheduler::new(
        otp_service,
        audit.clone(),
        Arc::new(RwLock::new(policy)),
        clock.clone(),
        SchedulerConfig::default(),
    ));

    Fixture {
        clock,
        otps,
        audit,
        delivery,
        auth_state: web::Data::new(AuthState { auth_service }),
        ops_state: web::Data::new(OpsState {
            scheduler,
            operator_token: Some(OPERATOR_TOKEN.to_string()),
        }),
    }
}

/// A login code for `identifier` issued at `issued_at` with a ten minute lifetime
pub fn login_record(identifier: &str, issued_at: DateTime<Utc>) -> OtpRecord {
    let key = OtpKey::new(identifier, IdentifierType::Email, OtpPurpose::Login);
    OtpRecord::new(
        &key,
        "4321".to_string(),
        format!("session-{}", identifier),
        3,
        issued_at,
        Duration::minutes(10),
    )
}
