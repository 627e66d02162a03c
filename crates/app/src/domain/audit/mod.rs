//! Audit trail

pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::AuditServiceError;
pub use service::*;
