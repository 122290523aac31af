//! One-time passcode configuration

use serde::{Deserialize, Serialize};

use super::environment::Environment;

/// OTP issuance and verification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Minutes until an issued code expires
    pub expiry_minutes: i64,

    /// Failed verifications allowed before the code locks
    pub max_attempts: i32,

    /// Number of digits in a generated code
    pub code_length: usize,

    /// Maximum codes issued per identifier within the request window
    pub request_limit: u32,

    /// Request window length in minutes
    pub request_window_minutes: i64,

    /// Fixed-code test accounts for non-production environments
    pub test_accounts: TestAccountConfig,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            expiry_minutes: 10,
            max_attempts: 3,
            code_length: 4,
            request_limit: 5,
            request_window_minutes: 30,
            test_accounts: TestAccountConfig::default(),
        }
    }
}

/// Test accounts that always receive a fixed code
///
/// Only honored in `allowed_environments`; never in production.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TestAccountConfig {
    /// Master switch
    pub enabled: bool,

    /// Fixed code issued to test accounts
    pub code: String,

    /// Emails or mobile numbers treated as test accounts
    pub identifiers: Vec<String>,

    /// Environments in which test accounts are honored
    pub allowed_environments: Vec<Environment>,
}

impl Default for TestAccountConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            code: String::from("1234"),
            identifiers: Vec::new(),
            allowed_environments: vec![Environment::Development, Environment::Staging],
        }
    }
}
