//! Normalized login identifier.

use std::fmt;

use og_shared::utils::identifier::{self as ident, IdentifierKind};
use serde::{Deserialize, Serialize};

use crate::domain::entities::IdentifierType;
use crate::errors::{DomainError, DomainResult};

/// A validated, normalized email address or mobile number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    value: String,
    kind: IdentifierType,
}

impl Identifier {
    /// Parses raw user input into an identifier
    ///
    /// # Errors
    ///
    /// `DomainError::Validation` if the input is empty or neither an email nor a mobile number
    pub fn parse(raw: &str) -> DomainResult<Self> {
        if raw.trim().is_empty() {
            return Err(DomainError::validation("identifier is required"));
        }

        let (kind, value) = ident::classify(raw)
            .ok_or_else(|| DomainError::validation("identifier must be a valid email or mobile number"))?;

        let kind = match kind {
            IdentifierKind::Email => IdentifierType::Email,
            IdentifierKind::Mobile => IdentifierType::Mobile,
        };

        Ok(Self { value, kind })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> IdentifierType {
        self.kind
    }

    /// Masked form for logs and audit entries
    pub fn masked(&self) -> String {
        ident::mask(&self.value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_email_lowercases() {
        let id = Identifier::parse("  User@Example.COM ").unwrap();
        assert_eq!(id.kind(), IdentifierType::Email);
        assert_eq!(id.as_str(), "user@example.com");
        assert_eq!(id.masked(), "u***@example.com");
    }

    #[test]
    fn test_parse_mobile_strips_separators() {
        let id = Identifier::parse("123-456-7899").unwrap();
        assert_eq!(id.kind(), IdentifierType::Mobile);
        assert_eq!(id.as_str(), "1234567899");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Identifier::parse(""), Err(DomainError::Validation { .. })));
        assert!(matches!(Identifier::parse("not-an-id"), Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_display_never_shows_raw_value() {
        let id = Identifier::parse("1234567899").unwrap();
        assert_eq!(id.to_string(), "******7899");
    }
}
