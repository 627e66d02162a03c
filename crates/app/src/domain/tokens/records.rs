//! Token Records

use custody::{ids::TokenId, status::TokenStatus};

/// Token Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub token_id: TokenId,
    pub description: String,
    pub status: TokenStatus,
}
