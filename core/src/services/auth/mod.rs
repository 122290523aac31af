//! Authentication service module
//!
//! Orchestrates the login flow on top of the OTP lifecycle:
//! - `initiate_login`: find or create the user, issue and deliver a code
//! - `resend_otp`: re-deliver the active code (or a new one once it expired)
//! - `verify_and_login`: verify the code and issue a session token

mod config;
mod delivery;
mod service;

#[cfg(test)]
mod tests;

pub use config::AuthServiceConfig;
pub use delivery::OtpDelivery;
pub use service::AuthService;
