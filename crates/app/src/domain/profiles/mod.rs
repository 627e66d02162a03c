//! User profiles

pub mod errors;
pub(crate) mod repository;
pub mod service;

pub use errors::ProfilesServiceError;
pub use service::*;
