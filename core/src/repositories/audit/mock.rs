//! Mock implementation of AuditLogRepository for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::AuditLog;
use crate::errors::DomainError;

use super::trait_::AuditLogRepository;

/// Mock implementation of AuditLogRepository for testing
pub struct MockAuditLogRepository {
    logs: Arc<RwLock<Vec<AuditLog>>>,
    should_fail: AtomicBool,
}

impl MockAuditLogRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            logs: Arc::new(RwLock::new(Vec::new())),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Set whether operations should fail
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Get all stored logs for testing
    pub async fn get_all_logs(&self) -> Vec<AuditLog> {
        self.logs.read().await.clone()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::internal("Mock repository error"));
        }
        Ok(())
    }
}

impl Default for MockAuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogRepository for MockAuditLogRepository {
    async fn create(&self, audit_log: &AuditLog) -> Result<(), DomainError> {
        self.check()?;
        self.logs.write().await.push(audit_log.clone());
        Ok(())
    }

    async fn find_recent(
        &self,
        identifier_masked: &str,
        limit: usize,
    ) -> Result<Vec<AuditLog>, DomainError> {
        self.check()?;
        let logs = self.logs.read().await;
        let mut matching: Vec<AuditLog> = logs
            .iter()
            .filter(|l| l.identifier_masked.as_deref() == Some(identifier_masked))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        self.check()?;
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|l| l.created_at >= cutoff);
        Ok((before - logs.len()) as u64)
    }
}
