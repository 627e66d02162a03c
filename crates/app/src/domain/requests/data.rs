//! Request Data

use custody::{ids::UserId, items::RequestItem};

/// New Request Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    /// Who is asking for the tokens.
    pub requester_id: UserId,

    /// Display name resolved by the caller, typically from the profile store.
    pub requester_display_name: Option<String>,

    /// Company/token pairs; duplicates by token are collapsed, last company wins.
    pub items: Vec<RequestItem>,

    /// Why the tokens are needed.
    pub purpose: String,

    /// Optional free-text note.
    pub comment: Option<String>,
}
