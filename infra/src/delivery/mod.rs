//! OTP delivery adapters
//!
//! Email and SMS providers live outside this repository. The only adapter
//! shipped here writes deliveries to the log, so a production deployment must
//! put a real provider behind `OtpDelivery`.

pub mod logging;

pub use logging::LoggingOtpDelivery;

use og_shared::Environment;

/// Build the delivery adapter for `environment`.
///
/// Codes are written to the log outside production only. In production the
/// log adapter delivers nothing to users, which is reported at error level.
pub fn create_otp_delivery(environment: Environment) -> LoggingOtpDelivery {
    if environment.is_production() {
        tracing::error!(
            environment = %environment,
            event = "otp_delivery_not_configured",
            "No OTP delivery provider configured for production; codes will not reach users"
        );
        return LoggingOtpDelivery::new(false);
    }

    tracing::info!(environment = %environment, "Using log-only OTP delivery");
    LoggingOtpDelivery::new(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_delivery_never_logs_codes() {
        assert!(!create_otp_delivery(Environment::Production).exposes_codes());
    }

    #[test]
    fn test_development_delivery_logs_codes() {
        assert!(create_otp_delivery(Environment::Development).exposes_codes());
        assert!(create_otp_delivery(Environment::Staging).exposes_codes());
    }
}
