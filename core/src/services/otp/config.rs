//! Configuration for the OTP service

use og_shared::OtpConfig;

use crate::domain::entities::{DEFAULT_CODE_LENGTH, DEFAULT_EXPIRY_MINUTES, DEFAULT_MAX_ATTEMPTS};

/// Configuration for the OTP service
#[derive(Debug, Clone)]
pub struct OtpServiceConfig {
    /// Minutes before an issued code expires
    pub expiry_minutes: i64,
    /// Failed verifications allowed before a code locks
    pub max_attempts: i32,
    /// Number of digits in a generated code
    pub code_length: usize,
    /// Codes that may be issued per key within the request window
    pub request_limit: u32,
    /// Request window length in minutes
    pub request_window_minutes: i64,
}

impl Default for OtpServiceConfig {
    fn default() -> Self {
        Self {
            expiry_minutes: DEFAULT_EXPIRY_MINUTES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            code_length: DEFAULT_CODE_LENGTH,
            request_limit: 5,
            request_window_minutes: 30,
        }
    }
}

impl From<&OtpConfig> for OtpServiceConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            expiry_minutes: config.expiry_minutes,
            max_attempts: config.max_attempts,
            code_length: config.code_length,
            request_limit: config.request_limit,
            request_window_minutes: config.request_window_minutes,
        }
    }
}
