//! Retention policy: what the cleanup scheduler may delete

use og_shared::RetentionConfig;

use super::types::PolicySnapshot;

/// Declarative retention policy.
///
/// User-account and valid-OTP cleanup have no setters and always read `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    clean_expired_otps: bool,
    clean_old_logs: bool,
    interval_minutes: u64,
    log_retention_days: i64,
    expired_warning_threshold: u64,
    #[cfg(test)]
    forced_unsafe: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&RetentionConfig::default())
    }
}

impl RetentionPolicy {
    pub fn from_config(config: &RetentionConfig) -> Self {
        Self {
            clean_expired_otps: config.clean_expired_otps,
            clean_old_logs: config.clean_old_logs,
            interval_minutes: config.interval_minutes.max(1),
            log_retention_days: config.log_retention_days,
            expired_warning_threshold: config.expired_warning_threshold,
            #[cfg(test)]
            forced_unsafe: false,
        }
    }

    pub fn clean_expired_otps(&self) -> bool {
        self.clean_expired_otps
    }

    pub fn clean_old_logs(&self) -> bool {
        self.clean_old_logs
    }

    pub fn clean_user_accounts(&self) -> bool {
        #[cfg(test)]
        if self.forced_unsafe {
            return true;
        }
        false
    }

    pub fn clean_valid_otps(&self) -> bool {
        #[cfg(test)]
        if self.forced_unsafe {
            return true;
        }
        false
    }

    pub fn interval_minutes(&self) -> u64 {
        self.interval_minutes
    }

    pub fn log_retention_days(&self) -> i64 {
        self.log_retention_days
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            clean_expired_otps: self.clean_expired_otps,
            clean_user_accounts: self.clean_user_accounts(),
            clean_valid_otps: self.clean_valid_otps(),
            clean_old_logs: self.clean_old_logs,
            interval_minutes: self.interval_minutes,
            log_retention_days: self.log_retention_days,
            expired_warning_threshold: self.expired_warning_threshold,
        }
    }

    /// Turn off every deletion. Used during incident response.
    pub fn emergency_disable_all(&mut self) {
        self.clean_expired_otps = false;
        self.clean_old_logs = false;
        tracing::warn!(
            event = "retention_emergency_disable",
            "All retention cleanup disabled; no data will be removed"
        );
    }

    /// Restore the default policy: expired OTPs only
    pub fn enable_safe_defaults(&mut self) {
        self.clean_expired_otps = true;
        self.clean_old_logs = false;
        tracing::info!(
            event = "retention_safe_defaults",
            "Safe cleanup enabled; only expired OTPs will be removed"
        );
    }

    /// Human-readable summary for ops tooling
    pub fn describe(&self) -> String {
        let otps = if self.clean_expired_otps {
            "expired OTPs removed every cycle, unexpired OTPs preserved"
        } else {
            "OTP cleanup disabled"
        };
        let logs = if self.clean_old_logs {
            format!("audit log entries older than {} days removed", self.log_retention_days)
        } else {
            "log cleanup disabled".to_string()
        };

        format!(
            "Retention every {} min: {}; {}; user accounts never deleted",
            self.interval_minutes, otps, logs
        )
    }

    /// Force the pinned flags on, to prove pre-flight rejects them
    #[cfg(test)]
    pub(crate) fn force_unsafe_flags(&mut self) {
        self.forced_unsafe = true;
    }
}
