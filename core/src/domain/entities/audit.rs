//! Audit log entity for recording authentication events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication events that are audited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    // Code sending events
    SendCodeRequest,
    SendCodeSuccess,
    SendCodeFailure,
    ResendCodeSuccess,

    // Code verification events
    VerifyCodeSuccess,
    VerifyCodeFailure,

    // Login events
    LoginSuccess,

    // Limits
    RequestLimitExceeded,
    AttemptsExceeded,
}

impl AuditEventType {
    /// Convert to string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendCodeRequest => "SEND_CODE_REQUEST",
            Self::SendCodeSuccess => "SEND_CODE_SUCCESS",
            Self::SendCodeFailure => "SEND_CODE_FAILURE",
            Self::ResendCodeSuccess => "RESEND_CODE_SUCCESS",
            Self::VerifyCodeSuccess => "VERIFY_CODE_SUCCESS",
            Self::VerifyCodeFailure => "VERIFY_CODE_FAILURE",
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::RequestLimitExceeded => "REQUEST_LIMIT_EXCEEDED",
            Self::AttemptsExceeded => "ATTEMPTS_EXCEEDED",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SEND_CODE_REQUEST" => Some(Self::SendCodeRequest),
            "SEND_CODE_SUCCESS" => Some(Self::SendCodeSuccess),
            "SEND_CODE_FAILURE" => Some(Self::SendCodeFailure),
            "RESEND_CODE_SUCCESS" => Some(Self::ResendCodeSuccess),
            "VERIFY_CODE_SUCCESS" => Some(Self::VerifyCodeSuccess),
            "VERIFY_CODE_FAILURE" => Some(Self::VerifyCodeFailure),
            "LOGIN_SUCCESS" => Some(Self::LoginSuccess),
            "REQUEST_LIMIT_EXCEEDED" => Some(Self::RequestLimitExceeded),
            "ATTEMPTS_EXCEEDED" => Some(Self::AttemptsExceeded),
            _ => None,
        }
    }

    fn is_success(&self) -> bool {
        matches!(
            self,
            Self::SendCodeSuccess | Self::ResendCodeSuccess | Self::VerifyCodeSuccess | Self::LoginSuccess
        )
    }
}

/// An audit log entry. Identifiers are stored masked only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditLog {
    /// Unique identifier for the log entry
    pub id: Uuid,

    pub event_type: AuditEventType,

    /// User ID if known at the time of the event
    pub user_id: Option<Uuid>,

    /// Masked identifier (e.g. "u***@example.com", "******7899")
    pub identifier_masked: Option<String>,

    pub success: bool,

    /// Failure reason for failed attempts
    pub failure_reason: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(event_type: AuditEventType, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            user_id: None,
            identifier_masked: None,
            success: event_type.is_success(),
            failure_reason: None,
            created_at: at,
        }
    }

    /// Add user context to the audit log
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Add an already-masked identifier
    pub fn with_identifier(mut self, masked: impl Into<String>) -> Self {
        self.identifier_masked = Some(masked.into());
        self
    }

    /// Add a failure reason and mark the entry unsuccessful
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self.success = false;
        self
    }
}
