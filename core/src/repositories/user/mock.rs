//! Mock implementation of UserRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{IdentifierType, User};
use crate::errors::DomainError;

use super::trait_::UserRepository;

/// Mock user repository for testing
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MockUserRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for MockUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn identifier_of(user: &User, identifier_type: IdentifierType) -> Option<&str> {
    match identifier_type {
        IdentifierType::Email => user.email.as_deref(),
        IdentifierType::Mobile => user.mobile_number.as_deref(),
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_identifier(
        &self,
        identifier: &str,
        identifier_type: IdentifierType,
    ) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| identifier_of(u, identifier_type) == Some(identifier))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        let duplicate = users.values().any(|u| {
            (user.email.is_some() && u.email == user.email)
                || (user.mobile_number.is_some() && u.mobile_number == user.mobile_number)
        });
        if duplicate {
            return Err(DomainError::validation("Identifier already registered"));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(
        &self,
        user_id: Uuid,
        identifier_type: IdentifierType,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or_else(|| DomainError::NotFound {
            resource: "User".to_string(),
        })?;
        user.record_login(identifier_type, at);
        Ok(())
    }
}
