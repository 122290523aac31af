//! Database module - MySQL implementations using SQLx
//!
//! This module provides:
//! - Connection pool management and migrations
//! - Repository implementations for OTP records, users and the audit log

pub mod connection;
pub mod mysql;


// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{MySqlAuditLogRepository, MySqlOtpRepository, MySqlUserRepository};

/// Map a SQLx error into the domain's internal error with context
pub(crate) fn db_error(context: &str, err: sqlx::Error) -> og_core::errors::DomainError {
    og_core::errors::DomainError::Internal {
        message: format!("{}: {}", context, err),
    }
}
