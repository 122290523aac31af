//! Domain-specific error types and error handling.

mod types;

// Re-export all error types
pub use types::{CleanupError, OtpError, TokenError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a store or infrastructure failure
    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal {
            message: message.into(),
        }
    }

    /// Whether the error should be shown to the end user as a 4xx
    pub fn is_client_error(&self) -> bool {
        match self {
            DomainError::Validation { .. } | DomainError::NotFound { .. } => true,
            DomainError::Otp(e) => !matches!(e, OtpError::DeliveryFailed { .. }),
            DomainError::Token(_) => true,
            DomainError::Cleanup(e) => !matches!(e, CleanupError::SafetyVerificationFailed { .. }),
            DomainError::Internal { .. } => false,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_errors_are_client_errors_except_delivery() {
        assert!(DomainError::from(OtpError::Expired).is_client_error());
        assert!(DomainError::from(OtpError::AttemptsExceeded { max_attempts: 3 }).is_client_error());
        assert!(!DomainError::from(OtpError::DeliveryFailed {
            message: "smtp down".into()
        })
        .is_client_error());
    }

    #[test]
    fn test_safety_failure_is_never_a_client_error() {
        let err = DomainError::from(CleanupError::SafetyVerificationFailed {
            issues: vec!["user account cleanup enabled".into()],
        });
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("user account cleanup enabled"));
    }
}
