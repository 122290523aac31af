//! # OtpGate Core
//!
//! Core business logic and domain layer for the OtpGate backend.
//! This crate contains domain entities, repository interfaces, error types,
//! the OTP lifecycle engine, the retention policy and the safety-gated
//! cleanup scheduler.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use errors::*;
pub use repositories::{AuditLogRepository, OtpRepository, UserRepository, VerificationTransition};
pub use services::{
    AuditService, AuthService, CleanupScheduler, OtpDelivery, OtpService, RetentionPolicy,
    TokenService,
};
