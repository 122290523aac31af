//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - JWT session token configuration
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `otp` - One-time passcode issuance and test account configuration
//! - `retention` - Data retention and cleanup scheduling
//! - `server` - HTTP server configuration for the ops surface

pub mod auth;
pub mod database;
pub mod environment;
pub mod otp;
pub mod retention;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use auth::JwtConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::{OtpConfig, TestAccountConfig};
pub use retention::RetentionConfig;
pub use server::ServerConfig;

/// Prefix for environment variable overrides (`OTPGATE__RETENTION__INTERVAL_MINUTES=15`)
pub const ENV_PREFIX: &str = "OTPGATE";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Ops HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session token configuration
    pub auth: JwtConfig,

    /// OTP issuance configuration
    pub otp: OtpConfig,

    /// Retention and cleanup configuration
    pub retention: RetentionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration in layers: serde defaults, then the optional
    /// per-environment TOML file, then `OTPGATE__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = Environment::from_env();
        Self::load_for(env, env.config_file())
    }

    /// Load configuration for an explicit environment and config file path
    pub fn load_for(env: Environment, config_file: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("environment", env.to_string())?
            .set_default("logging.level", LoggingConfig::for_environment(env).level)?
            .add_source(config::File::new(config_file, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would make the service unsafe to run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.otp.max_attempts == 0 {
            return Err(ConfigError::Invalid("otp.max_attempts must be at least 1".into()));
        }
        if !(4..=10).contains(&self.otp.code_length) {
            return Err(ConfigError::Invalid("otp.code_length must be between 4 and 10".into()));
        }
        if self.otp.expiry_minutes <= 0 {
            return Err(ConfigError::Invalid("otp.expiry_minutes must be positive".into()));
        }
        if self.retention.interval_minutes == 0 {
            return Err(ConfigError::Invalid("retention.interval_minutes must be positive".into()));
        }
        if self.environment.is_production() && self.auth.is_using_default_secret() {
            return Err(ConfigError::Invalid(
                "auth.secret must be set explicitly in production".into(),
            ));
        }
        Ok(())
    }
}
