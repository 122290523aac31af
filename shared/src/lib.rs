//! Shared utilities and common types for OtpGate services
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and layered loading
//! - Identifier (email / mobile) classification and masking
//! - API response envelopes

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, ConfigError, DatabaseConfig, Environment, JwtConfig, LogFormat, LoggingConfig,
    OtpConfig, RetentionConfig, ServerConfig, TestAccountConfig,
};
pub use types::{ApiResponse, ErrorResponse};
pub use utils::identifier;
