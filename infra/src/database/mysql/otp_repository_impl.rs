//! MySQL implementation of the OtpRepository trait.
//!
//! Writes that depend on what is currently active for a key (issue, resend)
//! hold a MySQL named lock for that key and run inside a transaction, so two
//! requests for the same identifier never both see "no active code".
//! Per-record transitions (verify, mark used) are single conditional UPDATEs
//! whose `WHERE` clause carries the precondition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::mysql::MySqlRow;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, MySql, MySqlConnection, MySqlPool};
use uuid::Uuid;

use og_core::domain::entities::{IdentifierType, OtpKey, OtpPurpose, OtpRecord};
use og_core::errors::DomainError;
use og_core::repositories::{OtpRepository, VerificationTransition};
use og_shared::identifier::mask;

use super::{column, uuid_column};
use crate::database::db_error;

/// Seconds to wait for another request holding the same key
const KEY_LOCK_TIMEOUT_SECS: i64 = 5;

const SELECT_COLUMNS: &str = r#"
    SELECT id, identifier, identifier_type, purpose, otp, session_token,
           attempts, max_attempts, is_used, used_at, expires_at,
           created_at, updated_at
    FROM otp_records
"#;

/// A pooled connection holding a `GET_LOCK` named lock.
///
/// Named locks belong to the MySQL session, not the transaction. If the guard is
/// dropped before `release` finishes (the request future was cancelled), the
/// connection is detached from the pool and closed so the server frees the lock,
/// instead of going back to the pool still holding it.
struct KeyLock {
    conn: Option<PoolConnection<MySql>>,
    name: String,
}

impl KeyLock {
    fn connection(&mut self) -> Result<&mut MySqlConnection, DomainError> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| DomainError::internal("OTP key lock already released"))
    }

    async fn release(mut self) {
        let Some(conn) = self.conn.as_mut() else {
            return;
        };
        match sqlx::query("SELECT RELEASE_LOCK(?)")
            .bind(&self.name)
            .execute(&mut **conn)
            .await
        {
            // Lock released: the connection can go back to the pool
            Ok(_) => drop(self.conn.take()),
            Err(e) => tracing::warn!(error = %e, "Failed to release OTP key lock"),
        }
    }
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!(
                lock = %self.name,
                event = "otp_key_lock_abandoned",
                "Closing connection that still holds an OTP key lock"
            );
            drop(conn.detach());
        }
    }
}

/// MySQL implementation of OtpRepository
pub struct MySqlOtpRepository {
    pool: MySqlPool,
}

impl MySqlOtpRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Named lock for a key. MySQL caps lock names at 64 characters.
    fn lock_name(key: &OtpKey) -> String {
        let digest = Sha256::digest(key.lock_name().as_bytes());
        format!("otp:{}", &hex::encode(digest)[..60])
    }

    fn row_to_record(row: &MySqlRow) -> Result<OtpRecord, DomainError> {
        let identifier_type: String = column(row, "identifier_type")?;
        let purpose: String = column(row, "purpose")?;

        Ok(OtpRecord {
            id: uuid_column(row, "id")?,
            identifier: column(row, "identifier")?,
            identifier_type: identifier_type
                .parse::<IdentifierType>()
                .map_err(DomainError::internal)?,
            purpose: purpose.parse::<OtpPurpose>().map_err(DomainError::internal)?,
            otp: column(row, "otp")?,
            session_token: column(row, "session_token")?,
            attempts: column(row, "attempts")?,
            max_attempts: column(row, "max_attempts")?,
            is_used: column(row, "is_used")?,
            used_at: column(row, "used_at")?,
            expires_at: column(row, "expires_at")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    async fn acquire_locked(&self, key: &OtpKey) -> Result<KeyLock, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        let name = Self::lock_name(key);

        let acquired: Option<i64> = sqlx::query_scalar("SELECT GET_LOCK(?, ?)")
            .bind(&name)
            .bind(KEY_LOCK_TIMEOUT_SECS)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to take OTP key lock", e))?;

        if acquired != Some(1) {
            tracing::warn!(
                identifier = %mask(&key.identifier),
                event = "otp_key_lock_timeout",
                "Timed out waiting for OTP key lock"
            );
            return Err(DomainError::internal("Timed out waiting for OTP key lock"));
        }
        Ok(KeyLock {
            conn: Some(conn),
            name,
        })
    }

    async fn latest_active(
        conn: &mut MySqlConnection,
        key: &OtpKey,
        session_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let mut sql = format!(
            "{} WHERE identifier = ? AND identifier_type = ? AND purpose = ? \
             AND is_used = FALSE AND expires_at > ?",
            SELECT_COLUMNS
        );
        if session_token.is_some() {
            sql.push_str(" AND session_token = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT 1");

        let mut query = sqlx::query(&sql)
            .bind(&key.identifier)
            .bind(key.identifier_type.as_str())
            .bind(key.purpose.as_str())
            .bind(now);
        if let Some(token) = session_token {
            query = query.bind(token);
        }

        query
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to query active OTP", e))?
            .as_ref()
            .map(Self::row_to_record)
            .transpose()
    }

    async fn insert(conn: &mut MySqlConnection, record: &OtpRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO otp_records (
                id, identifier, identifier_type, purpose, otp, session_token,
                attempts, max_attempts, is_used, used_at, expires_at,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.identifier)
        .bind(record.identifier_type.as_str())
        .bind(record.purpose.as_str())
        .bind(&record.otp)
        .bind(&record.session_token)
        .bind(record.attempts)
        .bind(record.max_attempts)
        .bind(record.is_used)
        .bind(record.used_at)
        .bind(record.expires_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to insert OTP", e))?;
        Ok(())
    }

    async fn insert_superseding_locked(
        conn: &mut MySqlConnection,
        record: &OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let mut tx = Connection::begin(conn)
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let superseded = sqlx::query(
            r#"
            UPDATE otp_records
            SET is_used = TRUE, updated_at = ?
            WHERE identifier = ? AND identifier_type = ? AND purpose = ?
              AND is_used = FALSE AND expires_at > ?
            "#,
        )
        .bind(now)
        .bind(&record.identifier)
        .bind(record.identifier_type.as_str())
        .bind(record.purpose.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to supersede active OTPs", e))?
        .rows_affected();

        Self::insert(&mut tx, record).await?;
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit OTP issue", e))?;
        Ok(superseded)
    }

    async fn reuse_or_insert_locked(
        conn: &mut MySqlConnection,
        candidate: OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<(OtpRecord, bool), DomainError> {
        let mut tx = Connection::begin(conn)
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        if let Some(active) = Self::latest_active(&mut tx, &candidate.key(), None, now).await? {
            tx.commit()
                .await
                .map_err(|e| db_error("Failed to commit OTP resend", e))?;
            return Ok((active, false));
        }

        Self::insert(&mut tx, &candidate).await?;
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit OTP resend", e))?;
        Ok((candidate, true))
    }

    /// Explain why a conditional update touched no row
    async fn classify_unchanged(
        conn: &mut MySqlConnection,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VerificationTransition, DomainError> {
        let Some(record) = Self::fetch_by_id(conn, id).await? else {
            return Ok(VerificationTransition::NotFound);
        };
        if record.is_used {
            Ok(VerificationTransition::AlreadyUsed)
        } else if record.is_locked() {
            Ok(VerificationTransition::Locked(record))
        } else if record.is_expired(now) {
            Ok(VerificationTransition::Expired)
        } else {
            Err(DomainError::internal(format!(
                "OTP {} is verifiable but the update did not apply",
                id
            )))
        }
    }

    async fn fetch_by_id(
        conn: &mut MySqlConnection,
        id: Uuid,
    ) -> Result<Option<OtpRecord>, DomainError> {
        sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to query OTP", e))?
            .as_ref()
            .map(Self::row_to_record)
            .transpose()
    }

    async fn count(sql: &str, now: DateTime<Utc>, pool: &MySqlPool) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(now)
            .fetch_one(pool)
            .await
            .map_err(|e| db_error("Failed to count OTPs", e))?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl OtpRepository for MySqlOtpRepository {
    async fn insert_superseding(
        &self,
        record: OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<OtpRecord, DomainError> {
        let mut lock = self.acquire_locked(&record.key()).await?;
        let result = Self::insert_superseding_locked(lock.connection()?, &record, now).await;
        lock.release().await;

        let superseded = result?;
        tracing::debug!(
            identifier = %mask(&record.identifier),
            otp_id = %record.id,
            superseded,
            "Stored OTP"
        );
        Ok(record)
    }

    async fn reuse_or_insert(
        &self,
        candidate: OtpRecord,
        now: DateTime<Utc>,
    ) -> Result<(OtpRecord, bool), DomainError> {
        let key = candidate.key();
        let mut lock = self.acquire_locked(&key).await?;
        let result = Self::reuse_or_insert_locked(lock.connection()?, candidate, now).await;
        lock.release().await;
        result
    }

    async fn find_active(
        &self,
        key: &OtpKey,
        session_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        Self::latest_active(&mut conn, key, session_token, now).await
    }

    async fn find_by_session(
        &self,
        key: &OtpKey,
        session_token: &str,
    ) -> Result<Option<OtpRecord>, DomainError> {
        sqlx::query(&format!(
            "{} WHERE identifier = ? AND identifier_type = ? AND purpose = ? \
             AND session_token = ? ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(&key.identifier)
        .bind(key.identifier_type.as_str())
        .bind(key.purpose.as_str())
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query OTP by session", e))?
        .as_ref()
        .map(Self::row_to_record)
        .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        Self::fetch_by_id(&mut conn, id).await
    }

    async fn apply_verification(
        &self,
        id: Uuid,
        matched: bool,
        now: DateTime<Utc>,
    ) -> Result<VerificationTransition, DomainError> {
        let set_clause = if matched {
            "is_used = TRUE, used_at = ?, updated_at = ?"
        } else {
            "attempts = attempts + 1, updated_at = ?"
        };
        let sql = format!(
            "UPDATE otp_records SET {} \
             WHERE id = ? AND is_used = FALSE AND attempts < max_attempts AND expires_at > ?",
            set_clause
        );

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        let mut tx = Connection::begin(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let mut query = sqlx::query(&sql);
        if matched {
            query = query.bind(now);
        }
        let applied = query
            .bind(now)
            .bind(id.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to apply OTP verification", e))?
            .rows_affected();

        let transition = if applied == 0 {
            Self::classify_unchanged(&mut tx, id, now).await?
        } else {
            let record = Self::fetch_by_id(&mut tx, id)
                .await?
                .ok_or_else(|| DomainError::internal("updated OTP vanished"))?;
            if matched {
                VerificationTransition::Consumed(record)
            } else {
                VerificationTransition::Mismatch(record)
            }
        };

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit OTP verification", e))?;
        Ok(transition)
    }

    async fn mark_used(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let applied = sqlx::query(
            "UPDATE otp_records SET is_used = TRUE, used_at = ?, updated_at = ? \
             WHERE id = ? AND is_used = FALSE",
        )
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark OTP used", e))?
        .rows_affected();

        if applied == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn count_issued_since(
        &self,
        key: &OtpKey,
        since: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM otp_records \
             WHERE identifier = ? AND identifier_type = ? AND purpose = ? AND created_at >= ?",
        )
        .bind(&key.identifier)
        .bind(key.identifier_type.as_str())
        .bind(key.purpose.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count issued OTPs", e))?;
        Ok(count.max(0) as u64)
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        Self::count(
            "SELECT COUNT(*) FROM otp_records WHERE expires_at < ?",
            now,
            &self.pool,
        )
        .await
    }

    async fn count_valid(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        Self::count(
            "SELECT COUNT(*) FROM otp_records WHERE is_used = FALSE AND expires_at > ?",
            now,
            &self.pool,
        )
        .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let deleted = sqlx::query("DELETE FROM otp_records WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete expired OTPs", e))?
            .rows_affected();
        Ok(deleted)
    }
}
