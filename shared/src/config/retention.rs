//! Data retention and cleanup scheduling configuration
//!
//! There is intentionally no setting for deleting user accounts or
//! still-valid OTPs: those deletions cannot be configured at all.

use serde::{Deserialize, Serialize};

/// Retention configuration consumed by the cleanup scheduler
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Whether the background scheduler is started with the process
    pub enabled: bool,

    /// Delete OTP records whose expiry has passed
    pub clean_expired_otps: bool,

    /// Delete audit log entries older than `log_retention_days`
    pub clean_old_logs: bool,

    /// Minutes between cleanup cycles
    pub interval_minutes: u64,

    /// Seconds to wait after startup before the first cycle
    pub initial_delay_seconds: u64,

    /// Age in days after which log entries may be deleted
    pub log_retention_days: i64,

    /// Expired-row count above which pre-flight raises a review warning
    pub expired_warning_threshold: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clean_expired_otps: true,
            clean_old_logs: false,
            interval_minutes: 30,
            initial_delay_seconds: 60,
            log_retention_days: 30,
            expired_warning_threshold: 10_000,
        }
    }
}
