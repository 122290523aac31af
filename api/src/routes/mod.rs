//! HTTP route handlers
//!
//! - `auth` - identifier login, resend, verification and profile
//! - `ops` - cleanup scheduler status and manual controls (operator token)
//! - `health` - liveness check

pub mod auth;
pub mod health;
pub mod ops;

pub use auth::AuthState;
pub use ops::OpsState;
