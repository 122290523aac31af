use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use og_core::domain::entities::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address or mobile number
    pub identifier: String,

    /// Country code for new mobile accounts, e.g. "+61"
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendRequest {
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub identifier: String,

    /// Session token returned by login or resend
    pub session_token: String,

    pub code: String,
}

/// Account view returned to the token holder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub country_code: Option<String>,
    pub full_name: Option<String>,
    pub is_email_verified: bool,
    pub is_mobile_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            mobile_number: user.mobile_number,
            country_code: user.country_code,
            full_name: user.full_name,
            is_email_verified: user.is_email_verified,
            is_mobile_verified: user.is_mobile_verified,
            last_login_at: user.last_login_at,
        }
    }
}
