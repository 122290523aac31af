//! Audit service for recording authentication events

mod service;

pub use service::AuditService;
