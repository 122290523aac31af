//! Audit service for recording authentication events.
//!
//! Writes are best-effort: a failure to persist an audit entry is logged and
//! never fails the authentication flow that produced it.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::entities::{AuditEventType, AuditLog};
use crate::repositories::AuditLogRepository;

/// Service for writing audit log entries
pub struct AuditService<R>
where
    R: AuditLogRepository,
{
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AuditService<R>
where
    R: AuditLogRepository + 'static,
{
    /// Create a new audit service
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Record a successful event
    pub async fn record(&self, event: AuditEventType, identifier_masked: &str, user_id: Option<Uuid>) {
        let mut entry = AuditLog::new(event, self.clock.now()).with_identifier(identifier_masked);
        if let Some(uid) = user_id {
            entry = entry.with_user(uid);
        }
        self.write_log(entry).await;
    }

    /// Record a failed event with a reason code
    pub async fn record_failure(
        &self,
        event: AuditEventType,
        identifier_masked: &str,
        user_id: Option<Uuid>,
        reason: &str,
    ) {
        let mut entry = AuditLog::new(event, self.clock.now())
            .with_identifier(identifier_masked)
            .with_failure(reason);
        if let Some(uid) = user_id {
            entry = entry.with_user(uid);
        }
        self.write_log(entry).await;
    }

    async fn write_log(&self, entry: AuditLog) {
        if let Err(e) = self.repository.create(&entry).await {
            tracing::error!(
                error = %e,
                event_type = entry.event_type.as_str(),
                "Failed to write audit log"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::repositories::MockAuditLogRepository;

    #[tokio::test]
    async fn test_record_and_failure() {
        let repo = Arc::new(MockAuditLogRepository::new());
        let service = AuditService::new(repo.clone(), Arc::new(SystemClock));

        service.record(AuditEventType::SendCodeSuccess, "u***@example.com", None).await;
        service
            .record_failure(AuditEventType::VerifyCodeFailure, "u***@example.com", None, "otp_invalid")
            .await;

        let logs = repo.get_all_logs().await;
        assert_eq!(logs.len(), 2);
        assert!(logs[0].success);
        assert!(!logs[1].success);
        assert_eq!(logs[1].failure_reason.as_deref(), Some("otp_invalid"));
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let repo = Arc::new(MockAuditLogRepository::new());
        repo.set_should_fail(true);
        let service = AuditService::new(repo.clone(), Arc::new(SystemClock));

        service.record(AuditEventType::LoginSuccess, "******7899", None).await;

        assert!(repo.get_all_logs().await.is_empty());
    }
}
