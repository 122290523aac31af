//! User repository trait defining the interface for user data persistence.
//!
//! There is intentionally no delete operation: accounts are never removed by
//! this system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{IdentifierType, User};
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by normalized email or mobile number
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user registered with that identifier
    /// * `Err(DomainError)` - Database or other error occurred
    async fn find_by_identifier(
        &self,
        identifier: &str,
        identifier_type: IdentifierType,
    ) -> Result<Option<User>, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Persist a new user
    ///
    /// # Errors
    /// `DomainError::Validation` if the identifier is already registered
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Record a successful login: sets `last_login_at` and the verified flag for the identifier used
    async fn record_login(
        &self,
        user_id: Uuid,
        identifier_type: IdentifierType,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}
