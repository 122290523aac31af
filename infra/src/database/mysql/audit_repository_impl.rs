//! MySQL implementation of the AuditLogRepository trait.
//!
//! Audit entries live in `auth_audit_log`. Rows are only ever inserted by the
//! auth flow and deleted by the retention sweep once they age out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;

use og_core::domain::entities::{AuditEventType, AuditLog};
use og_core::errors::DomainError;
use og_core::repositories::AuditLogRepository;

use super::{column, optional_uuid_column, uuid_column};
use crate::database::db_error;

/// MySQL implementation of AuditLogRepository
pub struct MySqlAuditLogRepository {
    pool: MySqlPool,
}

impl MySqlAuditLogRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_audit_log(row: &MySqlRow) -> Result<AuditLog, DomainError> {
        let event_type_str: String = column(row, "event_type")?;
        let event_type = AuditEventType::parse(&event_type_str).ok_or_else(|| {
            DomainError::internal(format!("Unknown event type: {}", event_type_str))
        })?;

        Ok(AuditLog {
            id: uuid_column(row, "id")?,
            event_type,
            user_id: optional_uuid_column(row, "user_id")?,
            identifier_masked: column(row, "identifier_masked")?,
            success: column(row, "success")?,
            failure_reason: column(row, "failure_reason")?,
            created_at: column(row, "created_at")?,
        })
    }
}

#[async_trait]
impl AuditLogRepository for MySqlAuditLogRepository {
    async fn create(&self, audit_log: &AuditLog) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO auth_audit_log (
                id, event_type, user_id, identifier_masked,
                success, failure_reason, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(audit_log.id.to_string())
        .bind(audit_log.event_type.as_str())
        .bind(audit_log.user_id.map(|id| id.to_string()))
        .bind(&audit_log.identifier_masked)
        .bind(audit_log.success)
        .bind(&audit_log.failure_reason)
        .bind(audit_log.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create audit log", e))?;

        tracing::debug!(
            audit_id = %audit_log.id,
            event_type = %audit_log.event_type.as_str(),
            "Audit log created"
        );
        Ok(())
    }

    async fn find_recent(
        &self,
        identifier_masked: &str,
        limit: usize,
    ) -> Result<Vec<AuditLog>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_type, user_id, identifier_masked,
                   success, failure_reason, created_at
            FROM auth_audit_log
            WHERE identifier_masked = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(identifier_masked)
        .bind(limit as u64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query audit logs", e))?;

        rows.iter().map(Self::row_to_audit_log).collect()
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let deleted = sqlx::query("DELETE FROM auth_audit_log WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete old audit logs", e))?
            .rows_affected();
        Ok(deleted)
    }
}
