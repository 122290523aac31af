//! Data retention: policy, pre-flight safety verification and the cleanup scheduler
//!
//! The scheduler is handed two narrow capabilities only, an
//! [`ExpiredOtpSweeper`] and a [`LogRetentionStore`]. It has no way to reach
//! user records or unexpired OTPs, so those deletions are unreachable rather
//! than merely disabled.

mod policy;
mod safety;
mod scheduler;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use policy::RetentionPolicy;
pub use safety::run_preflight;
pub use scheduler::{CleanupScheduler, SchedulerConfig};
pub use traits::{ExpiredOtpSweeper, LogRetentionStore};
pub use types::{
    CleanupRunRecord, CycleOutcome, PolicySnapshot, PreflightReport, SafetyIssue,
    SchedulerStatus, Severity,
};
