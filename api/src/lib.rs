//! # OtpGate API
//!
//! Process wiring for the OtpGate backend: configuration, tracing, the
//! login HTTP surface, the cleanup ops surface and the background
//! cleanup scheduler.

pub mod app;
pub mod bootstrap;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;
