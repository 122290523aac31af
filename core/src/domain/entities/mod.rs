//! Domain entities representing core business objects.

pub mod audit;
pub mod otp_record;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use audit::{AuditEventType, AuditLog};
pub use otp_record::{
    IdentifierType, OtpKey, OtpPurpose, OtpRecord, OtpState,
    DEFAULT_CODE_LENGTH, DEFAULT_EXPIRY_MINUTES, DEFAULT_MAX_ATTEMPTS,
};
pub use token::Claims;
pub use user::User;
