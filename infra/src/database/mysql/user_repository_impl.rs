//! MySQL implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use uuid::Uuid;

use og_core::domain::entities::{IdentifierType, User};
use og_core::errors::DomainError;
use og_core::repositories::UserRepository;

use super::{column, uuid_column};
use crate::database::db_error;

const SELECT_COLUMNS: &str = r#"
    SELECT id, email, mobile_number, country_code, full_name,
           is_email_verified, is_mobile_verified, is_active,
           last_login_at, created_at, updated_at
    FROM users
"#;

/// MySQL implementation of UserRepository
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn identifier_column(identifier_type: IdentifierType) -> &'static str {
        match identifier_type {
            IdentifierType::Email => "email",
            IdentifierType::Mobile => "mobile_number",
        }
    }

    fn row_to_user(row: &MySqlRow) -> Result<User, DomainError> {
        Ok(User {
            id: uuid_column(row, "id")?,
            email: column(row, "email")?,
            mobile_number: column(row, "mobile_number")?,
            country_code: column(row, "country_code")?,
            full_name: column(row, "full_name")?,
            is_email_verified: column(row, "is_email_verified")?,
            is_mobile_verified: column(row, "is_mobile_verified")?,
            is_active: column(row, "is_active")?,
            last_login_at: column(row, "last_login_at")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    fn is_duplicate_key(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_identifier(
        &self,
        identifier: &str,
        identifier_type: IdentifierType,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!(
            "{} WHERE {} = ? LIMIT 1",
            SELECT_COLUMNS,
            Self::identifier_column(identifier_type)
        );

        sqlx::query(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Database query failed", e))?
            .as_ref()
            .map(Self::row_to_user)
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        sqlx::query(&format!("{} WHERE id = ? LIMIT 1", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Database query failed", e))?
            .as_ref()
            .map(Self::row_to_user)
            .transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                id, email, mobile_number, country_code, full_name,
                is_email_verified, is_mobile_verified, is_active,
                last_login_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.mobile_number)
        .bind(&user.country_code)
        .bind(&user.full_name)
        .bind(user.is_email_verified)
        .bind(user.is_mobile_verified)
        .bind(user.is_active)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if Self::is_duplicate_key(&e) => {
                Err(DomainError::validation("Identifier already registered"))
            }
            Err(e) => Err(db_error("Failed to create user", e)),
        }
    }

    async fn record_login(
        &self,
        user_id: Uuid,
        identifier_type: IdentifierType,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let verified_column = match identifier_type {
            IdentifierType::Email => "is_email_verified",
            IdentifierType::Mobile => "is_mobile_verified",
        };
        let sql = format!(
            "UPDATE users SET last_login_at = ?, {} = TRUE, updated_at = ? WHERE id = ?",
            verified_column
        );

        let updated = sqlx::query(&sql)
            .bind(at)
            .bind(at)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to record login", e))?
            .rows_affected();

        if updated == 0 {
            return Err(DomainError::NotFound {
                resource: "User".to_string(),
            });
        }
        Ok(())
    }
}
