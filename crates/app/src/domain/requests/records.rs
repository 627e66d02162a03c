//! Request Records

use custody::{
    ids::{TokenId, UserId},
    status::{RequestStatus, TokenStatus},
};
use jiff::Timestamp;

use crate::ids::TypedId;

/// Request Id
pub type RequestId = TypedId<RequestRecord>;

/// Request Record
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub id: RequestId,
    pub requester_id: UserId,
    pub requester_display_name: Option<String>,
    pub purpose: String,
    pub comment: Option<String>,
    pub status: RequestStatus,
    pub requested_at: Timestamp,
    pub remind_sent_at: Option<Timestamp>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<Timestamp>,
    pub issued_by: Option<UserId>,
    pub issued_at: Option<Timestamp>,
    pub returned_by: Option<UserId>,
    pub returned_at: Option<Timestamp>,
}

/// Request Item Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestItemRecord {
    pub request_id: RequestId,
    pub company: String,
    pub token_id: TokenId,
}

/// Ledger-wide counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStatistics {
    /// Requests per status, in lifecycle order, zero-filled.
    pub requests_by_status: Vec<(RequestStatus, u64)>,

    /// Tokens per status, zero-filled.
    pub tokens_by_status: Vec<(TokenStatus, u64)>,

    /// Distinct requesters that ever submitted a request.
    pub distinct_requesters: u64,
}

impl LedgerStatistics {
    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.requests_by_status.iter().map(|(_, count)| count).sum()
    }

    #[must_use]
    pub fn requests_in(&self, status: RequestStatus) -> u64 {
        self.requests_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    }

    #[must_use]
    pub fn tokens_in(&self, status: TokenStatus) -> u64 {
        self.tokens_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    }
}
