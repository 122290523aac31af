//! Audit log repository trait defining the interface for audit log persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::AuditLog;
use crate::errors::DomainError;

/// Repository trait for AuditLog entity persistence operations
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Create a new audit log entry
    async fn create(&self, audit_log: &AuditLog) -> Result<(), DomainError>;

    /// Most recent entries for a masked identifier, ordered by created_at descending
    async fn find_recent(
        &self,
        identifier_masked: &str,
        limit: usize,
    ) -> Result<Vec<AuditLog>, DomainError>;

    /// Delete entries created before `cutoff`, returning the number removed
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
