//! OTP repository trait: the only write path for OTP records.
//!
//! Every method is a single atomic operation against the store. Callers never
//! read a record, decide, and write it back; the decision is pushed into the
//! store so concurrent requests for the same key cannot interleave.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{OtpKey, OtpRecord};
use crate::errors::DomainError;

/// Result of applying one verification attempt to a stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationTransition {
    /// Code matched; the record is now used
    Consumed(OtpRecord),
    /// Code did not match; `attempts` was incremented by one
    Mismatch(OtpRecord),
    /// Record was already used; nothing changed
    AlreadyUsed,
    /// Record had reached its attempt limit; nothing changed
    Locked(OtpRecord),
    /// Record was past its expiry; nothing changed
    Expired,
    /// No record with that id
    NotFound,
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Insert `record`, first marking any record still active for the same key as used.
    ///
    /// Superseded records get `is_used = true` with `used_at` left empty.
    async fn insert_superseding(
        &self,
        record: OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<OtpRecord, DomainError>;

    /// Return the active record for `candidate`'s key, or insert `candidate` if there is none.
    ///
    /// The boolean is `true` when `candidate` was inserted.
    async fn reuse_or_insert(
        &self,
        candidate: OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<(OtpRecord, bool), DomainError>;

    /// Most recently created active record for `key`, optionally bound to `session_token`
    async fn find_active(
        &self,
        key: &OtpKey,
        session_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError>;

    /// Latest record for `key` issued with `session_token`, whatever its state
    async fn find_by_session(
        &self,
        key: &OtpKey,
        session_token: &str,
    ) -> Result<Option<OtpRecord>, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, DomainError>;

    /// Conditionally consume the record (`matched`) or count a failed attempt
    async fn apply_verification(
        &self,
        id: Uuid,
        matched: bool,
        now: DateTime<Utc>,
    ) -> Result<VerificationTransition, DomainError>;

    /// Mark an unused record as used. `None` if missing or already used.
    async fn mark_used(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError>;

    /// Number of records created for `key` at or after `since`
    async fn count_issued_since(
        &self,
        key: &OtpKey,
        since: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    /// Records with `expires_at < now`
    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;

    /// Unused records with `expires_at > now`
    async fn count_valid(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;

    /// Delete every record with `expires_at < now`, returning the number removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
}
