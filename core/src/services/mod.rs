//! Business services containing domain logic and use cases.

pub mod audit;
pub mod auth;
pub mod otp;
pub mod retention;
pub mod token;

// Re-export commonly used types
pub use audit::AuditService;
pub use auth::{AuthService, AuthServiceConfig, OtpDelivery};
pub use otp::{
    generate_code, generate_session_token, OtpService, OtpServiceConfig, ResendResult,
    TestAccountPolicy, VerifyOutcome,
};
pub use retention::{
    run_preflight, CleanupRunRecord, CleanupScheduler, CycleOutcome, ExpiredOtpSweeper,
    LogRetentionStore, PolicySnapshot, PreflightReport, RetentionPolicy, SafetyIssue,
    SchedulerConfig, SchedulerStatus, Severity,
};
pub use token::{IssuedToken, TokenService, TokenServiceConfig};
