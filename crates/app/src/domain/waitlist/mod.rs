//! Waitlist queue

pub mod errors;
pub mod notifier;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::WaitlistServiceError;
pub use notifier::{LoggingNotifier, NotifyError, WaitlistNotifier};
pub use service::*;
