//! Mapping from domain errors to HTTP responses

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use og_core::errors::{CleanupError, DomainError, OtpError, TokenError};
use og_shared::ErrorResponse;

/// Error type returned by every handler
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub DomainError);

impl From<CleanupError> for ApiError {
    fn from(err: CleanupError) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    /// Stable machine-readable code for clients
    pub fn error_code(&self) -> &'static str {
        match &self.0 {
            DomainError::Validation { .. } => "validation_error",
            DomainError::NotFound { .. } => "not_found",
            DomainError::Internal { .. } => "internal_error",
            DomainError::Otp(e) => e.code(),
            DomainError::Token(TokenError::Expired) => "token_expired",
            DomainError::Token(_) => "token_invalid",
            DomainError::Cleanup(CleanupError::ConfirmationRequired) => "confirmation_required",
            DomainError::Cleanup(CleanupError::CycleInProgress) => "cycle_in_progress",
            DomainError::Cleanup(CleanupError::SafetyVerificationFailed { .. }) => {
                "safety_verification_failed"
            }
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            DomainError::Otp(e) => e.user_message(),
            DomainError::Internal { .. } => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Otp(OtpError::RequestLimitReached { .. }) => StatusCode::TOO_MANY_REQUESTS,
            DomainError::Otp(OtpError::DeliveryFailed { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Otp(_) => StatusCode::BAD_REQUEST,
            DomainError::Token(TokenError::GenerationFailed) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Token(_) => StatusCode::UNAUTHORIZED,
            DomainError::Cleanup(CleanupError::ConfirmationRequired) => StatusCode::BAD_REQUEST,
            DomainError::Cleanup(CleanupError::CycleInProgress) => StatusCode::CONFLICT,
            DomainError::Cleanup(CleanupError::SafetyVerificationFailed { .. })
            | DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.error_code(), "Request rejected");
        }

        let mut body = ErrorResponse::new(self.error_code(), self.message());
        if let DomainError::Otp(OtpError::InvalidCode { attempts_left }) = &self.0 {
            body = body.with_detail("attempts_left", json!(attempts_left));
        }
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(CleanupError::ConfirmationRequired).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CleanupError::CycleInProgress).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_otp_terminal_states_are_bad_requests() {
        for err in [
            OtpError::Expired,
            OtpError::AlreadyUsed,
            OtpError::AttemptsExceeded { max_attempts: 3 },
            OtpError::InvalidCode { attempts_left: 1 },
        ] {
            assert_eq!(
                ApiError(DomainError::Otp(err)).status_code(),
                StatusCode::BAD_REQUEST
            );
        }
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = ApiError(DomainError::internal("connection refused at 10.0.0.3"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "An internal error occurred");
    }
}
