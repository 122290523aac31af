//! Capabilities the cleanup scheduler is allowed to use

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DomainResult;
use crate::repositories::AuditLogRepository;

/// Counts and deletes expired OTP records. Nothing else.
#[async_trait]
pub trait ExpiredOtpSweeper: Send + Sync {
    /// Records whose expiry has passed
    async fn count_expired(&self) -> DomainResult<u64>;

    /// Unused records that have not expired yet
    async fn count_valid(&self) -> DomainResult<u64>;

    /// Delete records whose expiry has passed, returning how many were removed
    async fn purge_expired(&self) -> DomainResult<u64>;
}

/// Deletes log entries by age. Never touches user or OTP data.
#[async_trait]
pub trait LogRetentionStore: Send + Sync {
    async fn delete_logs_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;
}

#[async_trait]
impl<T: AuditLogRepository + ?Sized> LogRetentionStore for T {
    async fn delete_logs_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        self.delete_older_than(cutoff).await
    }
}
