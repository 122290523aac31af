//! Utility helpers

pub mod identifier;
