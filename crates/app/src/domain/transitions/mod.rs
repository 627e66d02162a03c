//! Request lifecycle transitions

pub mod errors;
pub mod service;

pub use errors::TransitionsServiceError;
pub use service::*;
