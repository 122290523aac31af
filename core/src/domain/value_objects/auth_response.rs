//! Authentication response value objects returned to the request layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::IdentifierType;

/// Returned after a code was issued (or re-sent) to an identifier.
///
/// Carries the session token the client must present at verification.
/// The code itself is never part of this response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginChallenge {
    pub session_token: String,

    pub identifier_type: IdentifierType,

    /// Masked identifier the code was sent to
    pub sent_to: String,

    pub expires_at: DateTime<Utc>,

    /// Whether a new code was generated (false when an active code was re-sent)
    pub is_new: bool,
}

/// Returned after a successful verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    /// Signed session JWT
    pub access_token: String,

    /// Token lifetime in seconds
    pub expires_in: i64,

    pub user_id: Uuid,

    pub identifier_type: IdentifierType,

    /// Whether this is the user's first successful login
    pub first_login: bool,
}
