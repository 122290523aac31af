//! Error types for the OTP lifecycle, the cleanup scheduler and session tokens

use thiserror::Error;

/// Outcomes of the OTP state machine that callers must surface distinctly
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid verification code ({attempts_left} attempts left)")]
    InvalidCode { attempts_left: i32 },

    #[error("Maximum verification attempts ({max_attempts}) exceeded")]
    AttemptsExceeded { max_attempts: i32 },

    #[error("Verification code already used")]
    AlreadyUsed,

    #[error("Verification code expired")]
    Expired,

    #[error("OTP request limit reached, retry in {window_minutes} minutes")]
    RequestLimitReached { window_minutes: i64 },

    #[error("OTP delivery failed: {message}")]
    DeliveryFailed { message: String },
}

impl OtpError {
    /// Stable error code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidCode { .. } => "otp_invalid",
            OtpError::AttemptsExceeded { .. } => "otp_attempts_exceeded",
            OtpError::AlreadyUsed => "otp_already_used",
            OtpError::Expired => "otp_expired",
            OtpError::RequestLimitReached { .. } => "otp_request_limit",
            OtpError::DeliveryFailed { .. } => "otp_delivery_failed",
        }
    }

    /// Message shown to the end user
    pub fn user_message(&self) -> String {
        match self {
            OtpError::InvalidCode { attempts_left } => {
                format!("The code you entered is incorrect. {} attempt(s) left.", attempts_left)
            }
            OtpError::AttemptsExceeded { .. } => {
                "Too many incorrect attempts. Please request a new code once this one expires.".to_string()
            }
            OtpError::AlreadyUsed => "This code has already been used. Please request a new one.".to_string(),
            OtpError::Expired => "The code has expired. Please resend.".to_string(),
            OtpError::RequestLimitReached { window_minutes } => {
                format!("OTP request limit reached. Please wait {} minutes.", window_minutes)
            }
            OtpError::DeliveryFailed { .. } => {
                "We could not send your code. Please try resending.".to_string()
            }
        }
    }
}

/// Cleanup scheduler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanupError {
    #[error("Manual cleanup requires explicit confirmation")]
    ConfirmationRequired,

    #[error("A cleanup cycle is already in progress")]
    CycleInProgress,

    #[error("Cleanup safety verification failed: {}", issues.join("; "))]
    SafetyVerificationFailed { issues: Vec<String> },
}

/// Session token errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token generation failed")]
    GenerationFailed,

    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,
}
