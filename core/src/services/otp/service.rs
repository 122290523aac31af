//! Main OTP service implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use og_shared::identifier::mask;

use crate::clock::Clock;
use crate::domain::entities::{OtpKey, OtpRecord};
use crate::errors::{DomainError, DomainResult, OtpError};
use crate::repositories::{OtpRepository, VerificationTransition};
use crate::services::retention::ExpiredOtpSweeper;

use super::config::OtpServiceConfig;
use super::generator::{generate_code, generate_session_token};
use super::test_accounts::TestAccountPolicy;
use super::types::{ResendResult, VerifyOutcome};

/// OTP lifecycle engine
pub struct OtpService<R: OtpRepository> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    config: OtpServiceConfig,
    test_accounts: TestAccountPolicy,
}

impl<R: OtpRepository> OtpService<R> {
    pub fn new(
        repository: Arc<R>,
        clock: Arc<dyn Clock>,
        config: OtpServiceConfig,
        test_accounts: TestAccountPolicy,
    ) -> Self {
        Self {
            repository,
            clock,
            config,
            test_accounts,
        }
    }

    pub fn config(&self) -> &OtpServiceConfig {
        &self.config
    }

    pub fn test_accounts(&self) -> &TestAccountPolicy {
        &self.test_accounts
    }

    /// Issue a fresh code for `key`, superseding any code still active for it
    ///
    /// # Errors
    ///
    /// `DomainError::Validation` if the identifier is empty
    pub async fn issue(&self, key: &OtpKey) -> DomainResult<OtpRecord> {
        Self::validate_key(key)?;
        let now = self.clock.now();
        let record = self.new_record(key, now);

        let record = self.repository.insert_superseding(record, now).await?;

        tracing::info!(
            identifier = %mask(&key.identifier),
            identifier_type = %key.identifier_type,
            purpose = %key.purpose,
            otp_id = %record.id,
            expires_at = %record.expires_at,
            event = "otp_issued",
            "Issued new OTP"
        );

        Ok(record)
    }

    /// Latest active record for `key`, optionally bound to a session token
    pub async fn find_active(
        &self,
        key: &OtpKey,
        session_token: Option<&str>,
    ) -> DomainResult<Option<OtpRecord>> {
        Self::validate_key(key)?;
        self.repository
            .find_active(key, session_token, self.clock.now())
            .await
    }

    /// The record issued with `session_token`, active or not.
    ///
    /// Lets a verify request on an expired, used or locked code be told which
    /// terminal state it hit instead of finding nothing.
    pub async fn find_by_session(
        &self,
        key: &OtpKey,
        session_token: &str,
    ) -> DomainResult<Option<OtpRecord>> {
        Self::validate_key(key)?;
        self.repository.find_by_session(key, session_token).await
    }

    /// Re-send the active code for `key`, or issue a new one if none is active
    ///
    /// A locked record still counts as active until it expires, so it is not
    /// replaced here; its code can no longer be verified, and the lock is
    /// reported instead of handing that code out again. `issue` (a fresh login)
    /// supersedes it.
    ///
    /// # Errors
    ///
    /// `OtpError::AttemptsExceeded` if the active record is locked
    pub async fn resend(&self, key: &OtpKey) -> DomainResult<ResendResult> {
        Self::validate_key(key)?;
        let now = self.clock.now();
        let candidate = self.new_record(key, now);

        let (record, is_new) = self.repository.reuse_or_insert(candidate, now).await?;

        if !is_new && record.is_locked() {
            tracing::warn!(
                identifier = %mask(&key.identifier),
                otp_id = %record.id,
                event = "otp_resend_locked",
                "Resend refused: active OTP is locked"
            );
            return Err(OtpError::AttemptsExceeded {
                max_attempts: record.max_attempts,
            }
            .into());
        }

        tracing::info!(
            identifier = %mask(&key.identifier),
            purpose = %key.purpose,
            otp_id = %record.id,
            is_new = is_new,
            event = "otp_resend",
            "Resolved OTP for resend"
        );

        let session_token = record.session_token.clone().ok_or_else(|| {
            DomainError::internal(format!("OTP record {} has no session token", record.id))
        })?;

        Ok(ResendResult {
            record_id: record.id,
            code: record.otp,
            session_token,
            expires_at: record.expires_at,
            is_new,
        })
    }

    /// Check `supplied` against `record` and apply the outcome atomically
    ///
    /// # Returns
    ///
    /// * `Ok(VerifyOutcome { valid: true, .. })` - the record is now used
    /// * `Ok(VerifyOutcome { valid: false, .. })` - attempts incremented
    /// * `Err(OtpError::AlreadyUsed | AttemptsExceeded | Expired)` - terminal record
    /// * `Err(DomainError::NotFound)` - the record no longer exists
    pub async fn verify(&self, record: &OtpRecord, supplied: &str) -> DomainResult<VerifyOutcome> {
        let matched = constant_time_eq(supplied.trim().as_bytes(), record.otp.as_bytes());
        let now = self.clock.now();

        match self.repository.apply_verification(record.id, matched, now).await? {
            VerificationTransition::Consumed(updated) => {
                tracing::info!(
                    identifier = %mask(&updated.identifier),
                    otp_id = %updated.id,
                    event = "otp_verified",
                    "OTP verified successfully"
                );
                Ok(VerifyOutcome {
                    valid: true,
                    attempts_left: updated.attempts_left(),
                })
            }
            VerificationTransition::Mismatch(updated) => {
                tracing::warn!(
                    identifier = %mask(&updated.identifier),
                    otp_id = %updated.id,
                    attempts = updated.attempts,
                    attempts_left = updated.attempts_left(),
                    event = "otp_verification_failed",
                    "Invalid OTP supplied"
                );
                Ok(VerifyOutcome {
                    valid: false,
                    attempts_left: updated.attempts_left(),
                })
            }
            VerificationTransition::Locked(locked) => {
                tracing::warn!(
                    identifier = %mask(&locked.identifier),
                    otp_id = %locked.id,
                    event = "otp_attempts_exceeded",
                    "Verification attempted on locked OTP"
                );
                Err(OtpError::AttemptsExceeded {
                    max_attempts: locked.max_attempts,
                }
                .into())
            }
            VerificationTransition::AlreadyUsed => Err(OtpError::AlreadyUsed.into()),
            VerificationTransition::Expired => Err(OtpError::Expired.into()),
            VerificationTransition::NotFound => Err(DomainError::NotFound {
                resource: "OTP".to_string(),
            }),
        }
    }

    /// Mark `record` used without a code check
    pub async fn mark_used(&self, record: &OtpRecord) -> DomainResult<OtpRecord> {
        let now = self.clock.now();
        match self.repository.mark_used(record.id, now).await? {
            Some(updated) => Ok(updated),
            None => match self.repository.find_by_id(record.id).await? {
                Some(_) => Err(OtpError::AlreadyUsed.into()),
                None => Err(DomainError::NotFound {
                    resource: "OTP".to_string(),
                }),
            },
        }
    }

    /// Delete every record whose expiry has passed
    pub async fn purge_expired(&self) -> DomainResult<u64> {
        let now = self.clock.now();
        let deleted = self.repository.delete_expired(now).await?;

        tracing::info!(
            deleted = deleted,
            cutoff = %now,
            event = "otp_purge",
            "Purged expired OTP records"
        );

        Ok(deleted)
    }

    /// Reject the request if `key` already had `request_limit` codes issued in the window
    pub async fn check_request_limit(&self, key: &OtpKey) -> DomainResult<()> {
        let since = self.clock.now() - Duration::minutes(self.config.request_window_minutes);
        let issued = self.repository.count_issued_since(key, since).await?;

        if issued >= u64::from(self.config.request_limit) {
            tracing::warn!(
                identifier = %mask(&key.identifier),
                purpose = %key.purpose,
                issued = issued,
                limit = self.config.request_limit,
                event = "otp_request_limit",
                "OTP request limit reached"
            );
            return Err(OtpError::RequestLimitReached {
                window_minutes: self.config.request_window_minutes,
            }
            .into());
        }

        Ok(())
    }

    fn new_record(&self, key: &OtpKey, now: DateTime<Utc>) -> OtpRecord {
        let code = match self.test_accounts.code_for(&key.identifier) {
            Some(fixed) => fixed.to_string(),
            None => generate_code(self.config.code_length),
        };

        OtpRecord::new(
            key,
            code,
            generate_session_token(),
            self.config.max_attempts,
            now,
            Duration::minutes(self.config.expiry_minutes),
        )
    }

    fn validate_key(key: &OtpKey) -> DomainResult<()> {
        if key.identifier.trim().is_empty() {
            return Err(DomainError::validation("identifier is required"));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: OtpRepository> ExpiredOtpSweeper for OtpService<R> {
    async fn count_expired(&self) -> DomainResult<u64> {
        self.repository.count_expired(self.clock.now()).await
    }

    async fn count_valid(&self) -> DomainResult<u64> {
        self.repository.count_valid(self.clock.now()).await
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        OtpService::purge_expired(self).await
    }
}
