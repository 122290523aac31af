//! # Infrastructure Layer
//!
//! Concrete implementations of the OtpGate core ports:
//!
//! - **Database**: MySQL connection pool, migrations and repositories using SQLx
//! - **Delivery**: OTP delivery adapters
//!
//! The OTP repository serializes every write for one identifier behind a
//! MySQL named lock, so concurrent issue, resend and verify requests for the
//! same key observe each other's effects.

// Re-export core types for convenience
pub use og_core::errors::*;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// OTP delivery adapters
pub mod delivery;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Internal {
            message: err.to_string(),
        }
    }
}
