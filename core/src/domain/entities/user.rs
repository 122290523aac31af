//! User entity representing an account that logs in with an email or mobile OTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::otp_record::IdentifierType;

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// Lower-cased email address, if the user logs in by email
    pub email: Option<String>,

    /// Digits-only mobile number, if the user logs in by mobile
    pub mobile_number: Option<String>,

    /// Country code (e.g., +91, +61)
    pub country_code: Option<String>,

    pub full_name: Option<String>,

    pub is_email_verified: bool,

    pub is_mobile_verified: bool,

    /// Inactive accounts cannot log in
    pub is_active: bool,

    /// Timestamp of the user's last successful login
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user keyed by a normalized identifier
    pub fn new(
        identifier: &str,
        identifier_type: IdentifierType,
        country_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let (email, mobile_number) = match identifier_type {
            IdentifierType::Email => (Some(identifier.to_string()), None),
            IdentifierType::Mobile => (None, Some(identifier.to_string())),
        };

        Self {
            id: Uuid::new_v4(),
            email,
            mobile_number,
            country_code,
            full_name: None,
            is_email_verified: false,
            is_mobile_verified: false,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records a successful OTP login, verifying the identifier used
    pub fn record_login(&mut self, identifier_type: IdentifierType, at: DateTime<Utc>) {
        match identifier_type {
            IdentifierType::Email => self.is_email_verified = true,
            IdentifierType::Mobile => self.is_mobile_verified = true,
        }
        self.last_login_at = Some(at);
        self.updated_at = at;
    }

    /// Whether either login identifier has been verified
    pub fn is_verified(&self) -> bool {
        self.is_email_verified || self.is_mobile_verified
    }
}
