//! OTP record entity: one issued passcode and its lifecycle state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of verification attempts before a record locks
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Default length of the numeric code
pub const DEFAULT_CODE_LENGTH: usize = 4;

/// Default lifetime of an issued code
pub const DEFAULT_EXPIRY_MINUTES: i64 = 10;

/// Kind of identifier an OTP was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    Email,
    Mobile,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "mobile" => Ok(Self::Mobile),
            other => Err(format!("unknown identifier type: {}", other)),
        }
    }
}

/// What the OTP authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Registration,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Registration => "registration",
            Self::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "registration" => Ok(Self::Registration),
            "password_reset" => Ok(Self::PasswordReset),
            other => Err(format!("unknown OTP purpose: {}", other)),
        }
    }
}

/// The (identifier, type, purpose) triple under which at most one record is active
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtpKey {
    pub identifier: String,
    pub identifier_type: IdentifierType,
    pub purpose: OtpPurpose,
}

impl OtpKey {
    pub fn new(identifier: impl Into<String>, identifier_type: IdentifierType, purpose: OtpPurpose) -> Self {
        Self {
            identifier: identifier.into(),
            identifier_type,
            purpose,
        }
    }

    /// Stable string form, used for advisory locking in the store
    pub fn lock_name(&self) -> String {
        format!(
            "{}:{}:{}",
            self.identifier_type.as_str(),
            self.purpose.as_str(),
            self.identifier
        )
    }
}

/// Lifecycle state of a record at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpState {
    /// Issued, unused, unexpired and below the attempt limit
    Created,
    /// Successfully verified (or superseded by a newer issue)
    Verified,
    /// Past `expires_at`
    Expired,
    /// Attempt limit reached before expiry
    Locked,
}

/// A persisted OTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub id: Uuid,

    /// Normalized identifier (lower-cased email or digits-only mobile)
    pub identifier: String,

    pub identifier_type: IdentifierType,

    pub purpose: OtpPurpose,

    /// The plaintext numeric code
    pub otp: String,

    /// Opaque token binding a client's verify attempt to this record
    pub session_token: Option<String>,

    pub attempts: i32,

    pub max_attempts: i32,

    pub is_used: bool,

    /// Set when the record was consumed by a successful verification
    pub used_at: Option<DateTime<Utc>>,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Builds a fresh, unused record issued at `now`
    pub fn new(
        key: &OtpKey,
        otp: String,
        session_token: String,
        max_attempts: i32,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: key.identifier.clone(),
            identifier_type: key.identifier_type,
            purpose: key.purpose,
            otp,
            session_token: Some(session_token),
            attempts: 0,
            max_attempts,
            is_used: false,
            used_at: None,
            expires_at: now + lifetime,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> OtpKey {
        OtpKey::new(self.identifier.clone(), self.identifier_type, self.purpose)
    }

    /// Unused and not yet expired. Locked records are still active until they expire,
    /// which keeps them in place so a resend cannot mint a fresh code early.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && self.expires_at > now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_locked(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub fn attempts_left(&self) -> i32 {
        (self.max_attempts - self.attempts).max(0)
    }

    /// Whether `session_token` matches this record; `None` matches anything
    pub fn matches_session(&self, session_token: Option<&str>) -> bool {
        match session_token {
            Some(token) => self.session_token.as_deref() == Some(token),
            None => true,
        }
    }

    /// Terminal states take precedence: used, then locked, then expired
    pub fn state(&self, now: DateTime<Utc>) -> OtpState {
        if self.is_used {
            OtpState::Verified
        } else if self.is_locked() {
            OtpState::Locked
        } else if self.is_expired(now) {
            OtpState::Expired
        } else {
            OtpState::Created
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(now: DateTime<Utc>) -> OtpRecord {
        let key = OtpKey::new("user@example.com", IdentifierType::Email, OtpPurpose::Login);
        OtpRecord::new(
            &key,
            "4821".to_string(),
            "a".repeat(64),
            DEFAULT_MAX_ATTEMPTS,
            now,
            Duration::minutes(DEFAULT_EXPIRY_MINUTES),
        )
    }

    #[test]
    fn test_new_record_is_active() {
        let now = Utc::now();
        let record = record_at(now);

        assert!(record.is_active(now));
        assert_eq!(record.state(now), OtpState::Created);
        assert_eq!(record.attempts_left(), 3);
        assert_eq!(record.expires_at, now + Duration::minutes(10));
    }

    #[test]
    fn test_record_expires_exactly_at_expiry() {
        let now = Utc::now();
        let record = record_at(now);

        assert!(record.is_active(record.expires_at - Duration::seconds(1)));
        assert!(!record.is_active(record.expires_at));
        assert_eq!(record.state(record.expires_at), OtpState::Expired);
    }

    #[test]
    fn test_locked_record_stays_active_until_expiry() {
        let now = Utc::now();
        let mut record = record_at(now);
        record.attempts = record.max_attempts;

        assert!(record.is_locked());
        assert!(record.is_active(now));
        assert_eq!(record.state(now), OtpState::Locked);
        assert_eq!(record.attempts_left(), 0);
    }

    #[test]
    fn test_used_takes_precedence_over_other_states() {
        let now = Utc::now();
        let mut record = record_at(now);
        record.is_used = true;
        record.attempts = record.max_attempts;

        assert_eq!(record.state(now + Duration::hours(1)), OtpState::Verified);
    }

    #[test]
    fn test_session_matching() {
        let record = record_at(Utc::now());
        assert!(record.matches_session(None));
        assert!(record.matches_session(Some(&"a".repeat(64))));
        assert!(!record.matches_session(Some("other")));
    }

    #[test]
    fn test_enum_string_forms() {
        assert_eq!("password_reset".parse::<OtpPurpose>(), Ok(OtpPurpose::PasswordReset));
        assert_eq!(IdentifierType::Mobile.to_string(), "mobile");
        assert!("sms".parse::<IdentifierType>().is_err());
    }
}
