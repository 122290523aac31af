pub mod audit;
pub mod otp;
pub mod user;

pub use audit::AuditLogRepository;
pub use otp::{OtpRepository, VerificationTransition};
pub use user::UserRepository;

#[cfg(any(test, feature = "test-support"))]
pub use audit::MockAuditLogRepository;
#[cfg(any(test, feature = "test-support"))]
pub use otp::MockOtpRepository;
#[cfg(any(test, feature = "test-support"))]
pub use user::MockUserRepository;
