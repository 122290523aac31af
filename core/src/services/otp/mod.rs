//! OTP lifecycle service
//!
//! Issues, re-sends, verifies and purges one-time passcodes. All state lives in
//! the `OtpRepository`; this service owns the rules:
//! - at most one active code per (identifier, type, purpose)
//! - resend reuses the active code instead of minting a new one
//! - a code locks after `max_attempts` failed verifications
//! - expired codes are only ever removed by `purge_expired`

mod config;
mod generator;
mod service;
mod test_accounts;
mod types;

#[cfg(test)]
mod tests;

pub use config::OtpServiceConfig;
pub use generator::{generate_code, generate_session_token};
pub use service::OtpService;
pub use test_accounts::TestAccountPolicy;
pub use types::{ResendResult, VerifyOutcome};
