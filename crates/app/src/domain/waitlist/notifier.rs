//! Waitlist notification hand-off.
//!
//! The ledger never delivers messages itself. When a returned token frees up, every waiter that
//! was drained from the queue is handed to a [`WaitlistNotifier`], one entry at a time.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::info;

use crate::domain::waitlist::records::WaitlistEntry;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification could not be delivered: {0}")]
    Delivery(String),
}

#[automock]
#[async_trait]
pub trait WaitlistNotifier: Send + Sync {
    /// Tell one waiter that the token they waited for is available again.
    async fn notify(&self, entry: &WaitlistEntry) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line per waiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl WaitlistNotifier for LoggingNotifier {
    async fn notify(&self, entry: &WaitlistEntry) -> Result<(), NotifyError> {
        info!(
            requester_id = %entry.requester_id,
            token_id = %entry.token_id,
            company = %entry.company,
            "token available for waiting requester"
        );

        Ok(())
    }
}
