//! MySQL-specific database implementations
//!
//! This module contains MySQL implementations of repository traits
//! using SQLx for database operations.

pub mod audit_repository_impl;
pub mod otp_repository_impl;
pub mod user_repository_impl;

// Re-export the MySQL implementations
pub use audit_repository_impl::MySqlAuditLogRepository;
pub use otp_repository_impl::MySqlOtpRepository;
pub use user_repository_impl::MySqlUserRepository;

use og_core::errors::DomainError;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Row};
use uuid::Uuid;

/// Read one column, mapping decode failures to an internal error naming the column
pub(crate) fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get(name).map_err(|e| DomainError::Internal {
        message: format!("Failed to get {}: {}", name, e),
    })
}

/// Read a CHAR(36) column as a UUID
pub(crate) fn uuid_column(row: &MySqlRow, name: &str) -> Result<Uuid, DomainError> {
    let raw: String = column(row, name)?;
    Uuid::parse_str(&raw).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID in {}: {}", name, e),
    })
}

/// Read a nullable CHAR(36) column as a UUID
pub(crate) fn optional_uuid_column(
    row: &MySqlRow,
    name: &str,
) -> Result<Option<Uuid>, DomainError> {
    let raw: Option<String> = column(row, name)?;
    raw.map(|id| Uuid::parse_str(&id))
        .transpose()
        .map_err(|e| DomainError::Internal {
            message: format!("Invalid UUID in {}: {}", name, e),
        })
}
