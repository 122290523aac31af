//! Types for OTP service results

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of a resend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendResult {
    /// Id of the record backing the code
    pub record_id: Uuid,
    /// Plaintext code, to be handed to the delivery collaborator
    pub code: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    /// `false` when an active code was reused
    pub is_new: bool,
}

/// Result of a verification attempt that did not hit a terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Whether the code matched (the record is now used)
    pub valid: bool,
    /// Attempts remaining before the record locks
    pub attempts_left: i32,
}
