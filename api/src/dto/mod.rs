//! Request and response bodies

pub mod auth;
pub mod ops;

pub use auth::{LoginRequest, ProfileResponse, ResendRequest, VerifyRequest};
pub use ops::{CleanupRunResponse, RunCleanupRequest};
