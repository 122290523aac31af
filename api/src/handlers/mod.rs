//! Shared request handling helpers

pub mod error;

pub use error::ApiError;
