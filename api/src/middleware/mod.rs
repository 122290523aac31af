//! Request guards

pub mod auth;

pub use auth::{AuthContext, JwtAuth, OperatorAuth};
