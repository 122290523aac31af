//! Main authentication service implementation

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::entities::{AuditEventType, IdentifierType, OtpKey, OtpPurpose, User};
use crate::domain::value_objects::{AuthSession, Identifier, LoginChallenge};
use crate::errors::{DomainError, DomainResult, OtpError};
use crate::repositories::{AuditLogRepository, OtpRepository, UserRepository};
use crate::services::audit::AuditService;
use crate::services::otp::OtpService;
use crate::services::token::TokenService;

use super::config::AuthServiceConfig;
use super::delivery::OtpDelivery;

/// Authentication service for the OTP login flow
pub struct AuthService<U, O, A, D>
where
    U: UserRepository,
    O: OtpRepository,
    A: AuditLogRepository + 'static,
    D: OtpDelivery,
{
    user_repository: Arc<U>,
    otp_service: Arc<OtpService<O>>,
    token_service: Arc<TokenService>,
    audit_service: Arc<AuditService<A>>,
    delivery: Arc<D>,
    clock: Arc<dyn Clock>,
    config: AuthServiceConfig,
}

impl<U, O, A, D> AuthService<U, O, A, D>
where
    U: UserRepository,
    O: OtpRepository,
    A: AuditLogRepository + 'static,
    D: OtpDelivery,
{
    pub fn new(
        user_repository: Arc<U>,
        otp_service: Arc<OtpService<O>>,
        token_service: Arc<TokenService>,
        audit_service: Arc<AuditService<A>>,
        delivery: Arc<D>,
        clock: Arc<dyn Clock>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            otp_service,
            token_service,
            audit_service,
            delivery,
            clock,
            config,
        }
    }

    /// Start a login: find or create the user, issue a fresh code and deliver it
    ///
    /// # Errors
    ///
    /// * `Validation` - malformed identifier or inactive account
    /// * `OtpError::RequestLimitReached` - too many codes in the window
    /// * `OtpError::DeliveryFailed` - code persisted but not delivered
    pub async fn initiate_login(
        &self,
        raw_identifier: &str,
        country_code: Option<&str>,
    ) -> DomainResult<LoginChallenge> {
        let identifier = Identifier::parse(raw_identifier)?;
        let masked = identifier.masked();
        self.audit_service
            .record(AuditEventType::SendCodeRequest, &masked, None)
            .await;

        let user = self.find_or_create_user(&identifier, country_code).await?;
        if !user.is_active {
            return Err(DomainError::validation("account is disabled"));
        }

        let key = Self::login_key(&identifier);
        if let Err(e) = self.otp_service.check_request_limit(&key).await {
            self.audit_service
                .record_failure(AuditEventType::RequestLimitExceeded, &masked, Some(user.id), "otp_request_limit")
                .await;
            return Err(e);
        }

        let record = self.otp_service.issue(&key).await?;
        self.deliver(&identifier, &record.otp, user.country_code.as_deref(), user.id)
            .await?;

        self.audit_service
            .record(AuditEventType::SendCodeSuccess, &masked, Some(user.id))
            .await;

        let session_token = record
            .session_token
            .ok_or_else(|| DomainError::internal("issued OTP has no session token"))?;

        Ok(LoginChallenge {
            session_token,
            identifier_type: identifier.kind(),
            sent_to: masked,
            expires_at: record.expires_at,
            is_new: true,
        })
    }

    /// Re-deliver the active code, or a new one if none is active
    ///
    /// # Errors
    ///
    /// * `NotFound` - the user never initiated a login
    /// * `OtpError::AttemptsExceeded` - the active code is locked; a new login issues a fresh one
    pub async fn resend_otp(&self, raw_identifier: &str) -> DomainResult<LoginChallenge> {
        let identifier = Identifier::parse(raw_identifier)?;
        let masked = identifier.masked();

        let user = self
            .user_repository
            .find_by_identifier(identifier.as_str(), identifier.kind())
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: "User".to_string(),
            })?;

        let key = Self::login_key(&identifier);
        if self.otp_service.find_active(&key, None).await?.is_none() {
            self.otp_service.check_request_limit(&key).await?;
        }

        let resent = self.otp_service.resend(&key).await?;
        self.deliver(&identifier, &resent.code, user.country_code.as_deref(), user.id)
            .await?;

        self.audit_service
            .record(AuditEventType::ResendCodeSuccess, &masked, Some(user.id))
            .await;

        Ok(LoginChallenge {
            session_token: resent.session_token,
            identifier_type: identifier.kind(),
            sent_to: masked,
            expires_at: resent.expires_at,
            is_new: resent.is_new,
        })
    }

    /// Verify the code bound to `session_token` and issue a session JWT
    ///
    /// # Errors
    ///
    /// * `NotFound` - unknown session (never issued, or already purged), or no user
    /// * `OtpError::InvalidCode` - wrong code, attempts left reported
    /// * `OtpError::AttemptsExceeded` / `AlreadyUsed` / `Expired` - terminal code
    pub async fn verify_and_login(
        &self,
        raw_identifier: &str,
        session_token: &str,
        code: &str,
    ) -> DomainResult<AuthSession> {
        let identifier = Identifier::parse(raw_identifier)?;
        let masked = identifier.masked();
        if session_token.trim().is_empty() || code.trim().is_empty() {
            return Err(DomainError::validation("session token and code are required"));
        }

        let key = Self::login_key(&identifier);
        let record = match self.otp_service.find_active(&key, Some(session_token)).await? {
            Some(active) => active,
            // Not active: verify reports whether it expired, was used or is locked
            None => self
                .otp_service
                .find_by_session(&key, session_token)
                .await?
                .ok_or_else(|| DomainError::NotFound {
                    resource: "OTP session".to_string(),
                })?,
        };

        let outcome = match self.otp_service.verify(&record, code).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let event = match &e {
                    DomainError::Otp(OtpError::AttemptsExceeded { .. }) => AuditEventType::AttemptsExceeded,
                    _ => AuditEventType::VerifyCodeFailure,
                };
                let reason = match &e {
                    DomainError::Otp(otp) => otp.code(),
                    _ => "verification_error",
                };
                self.audit_service.record_failure(event, &masked, None, reason).await;
                return Err(e);
            }
        };

        if !outcome.valid {
            self.audit_service
                .record_failure(AuditEventType::VerifyCodeFailure, &masked, None, "otp_invalid")
                .await;
            return Err(OtpError::InvalidCode {
                attempts_left: outcome.attempts_left,
            }
            .into());
        }

        self.audit_service
            .record(AuditEventType::VerifyCodeSuccess, &masked, None)
            .await;

        let user = self
            .user_repository
            .find_by_identifier(identifier.as_str(), identifier.kind())
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: "User".to_string(),
            })?;

        let first_login = user.last_login_at.is_none();
        self.user_repository
            .record_login(user.id, identifier.kind(), self.clock.now())
            .await?;

        let issued = self.token_service.issue(user.id, identifier.kind())?;

        self.audit_service
            .record(AuditEventType::LoginSuccess, &masked, Some(user.id))
            .await;
        tracing::info!(
            user_id = %user.id,
            identifier = %masked,
            event = "login_success",
            "User logged in"
        );

        Ok(AuthSession {
            access_token: issued.token,
            expires_in: issued.expires_in,
            user_id: user.id,
            identifier_type: identifier.kind(),
            first_login,
        })
    }

    /// Account behind a verified access token
    ///
    /// # Errors
    ///
    /// * `NotFound` - the user was removed after the token was issued
    /// * `Validation` - the account has been deactivated
    pub async fn profile(&self, user_id: Uuid) -> DomainResult<User> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: "User".to_string(),
            })?;
        if !user.is_active {
            return Err(DomainError::validation("account is disabled"));
        }
        Ok(user)
    }

    /// Verifier for the access tokens this service issues
    pub fn token_service(&self) -> Arc<TokenService> {
        Arc::clone(&self.token_service)
    }

    fn login_key(identifier: &Identifier) -> OtpKey {
        OtpKey::new(identifier.as_str(), identifier.kind(), OtpPurpose::Login)
    }

    async fn find_or_create_user(
        &self,
        identifier: &Identifier,
        country_code: Option<&str>,
    ) -> DomainResult<User> {
        if let Some(user) = self
            .user_repository
            .find_by_identifier(identifier.as_str(), identifier.kind())
            .await?
        {
            return Ok(user);
        }

        let country_code = match identifier.kind() {
            IdentifierType::Mobile => Some(
                country_code
                    .map(str::to_string)
                    .unwrap_or_else(|| self.config.default_country_code.clone()),
            ),
            IdentifierType::Email => None,
        };
        let user = User::new(identifier.as_str(), identifier.kind(), country_code, self.clock.now());

        match self.user_repository.create(user).await {
            Ok(created) => {
                tracing::info!(
                    user_id = %created.id,
                    identifier = %identifier.masked(),
                    event = "user_created",
                    "Created new user"
                );
                Ok(created)
            }
            // Lost a creation race: the other request's user is the one we want
            Err(create_err) => self
                .user_repository
                .find_by_identifier(identifier.as_str(), identifier.kind())
                .await?
                .ok_or(create_err),
        }
    }

    async fn deliver(
        &self,
        identifier: &Identifier,
        code: &str,
        country_code: Option<&str>,
        user_id: Uuid,
    ) -> DomainResult<()> {
        if self.otp_service.test_accounts().is_test_account(identifier.as_str()) {
            tracing::info!(
                identifier = %identifier.masked(),
                "Skipping delivery for test account"
            );
            return Ok(());
        }

        match self.delivery.send_code(identifier, code, country_code).await {
            Ok(message_id) => {
                tracing::info!(
                    identifier = %identifier.masked(),
                    message_id = %message_id,
                    event = "otp_delivered",
                    "OTP delivered"
                );
                Ok(())
            }
            Err(message) => {
                tracing::error!(
                    identifier = %identifier.masked(),
                    error = %message,
                    event = "otp_delivery_failed",
                    "Failed to deliver OTP"
                );
                self.audit_service
                    .record_failure(AuditEventType::SendCodeFailure, &identifier.masked(), Some(user_id), "otp_delivery_failed")
                    .await;
                Err(OtpError::DeliveryFailed { message }.into())
            }
        }
    }
}
