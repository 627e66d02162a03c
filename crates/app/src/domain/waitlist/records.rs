//! Waitlist Records

use custody::ids::{TokenId, UserId};
use jiff::Timestamp;

/// A requester waiting to hear that a token became available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistEntry {
    pub requester_id: UserId,
    pub token_id: TokenId,
    pub company: String,
    pub created_at: Timestamp,
}
