//! Value objects representing immutable domain concepts.

pub mod auth_response;
pub mod identifier;

// Re-export commonly used types
pub use auth_response::{AuthSession, LoginChallenge};
pub use identifier::Identifier;
