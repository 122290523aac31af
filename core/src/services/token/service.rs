//! Session token service implementation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::domain::entities::{Claims, IdentifierType};
use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;

/// A signed session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Issues and verifies HS256 session JWTs
pub struct TokenService {
    config: TokenServiceConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: TokenServiceConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Issue a session token for a user who just verified `identifier_type`
    pub fn issue(&self, user_id: Uuid, identifier_type: IdentifierType) -> Result<IssuedToken, DomainError> {
        let lifetime = Duration::hours(self.config.expiry_hours);
        let claims = Claims::new(
            user_id,
            identifier_type,
            Utc::now(),
            lifetime,
            self.config.issuer.clone(),
            self.config.audience.clone(),
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            DomainError::Token(TokenError::GenerationFailed)
        })?;

        Ok(IssuedToken {
            token,
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Verify a session token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, DomainError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => DomainError::Token(TokenError::Expired),
                _ => DomainError::Token(TokenError::Invalid),
            })
    }
}
