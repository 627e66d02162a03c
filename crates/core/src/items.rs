//! Request items and request limits

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::TokenId;

/// One leased token within a request, together with the company it is used for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestItem {
    /// Company the token signs for.
    pub company: String,

    /// Token being leased.
    pub token_id: TokenId,
}

impl RequestItem {
    /// Create an item.
    pub fn new(company: impl Into<String>, token_id: impl Into<TokenId>) -> Self {
        Self {
            company: company.into(),
            token_id: token_id.into(),
        }
    }
}

/// Collapse items that name the same token.
///
/// When a token appears more than once, the last occurrence's company wins. The result is
/// ordered by token id, independent of input order, so reservations always lock tokens in
/// the same order.
#[must_use]
pub fn dedupe_items<I>(items: I) -> Vec<RequestItem>
where
    I: IntoIterator<Item = RequestItem>,
{
    let unique: BTreeMap<TokenId, String> = items
        .into_iter()
        .map(|item| (item.token_id, item.company))
        .collect();

    unique
        .into_iter()
        .map(|(token_id, company)| RequestItem { company, token_id })
        .collect()
}

/// Request input rejected before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The request names no tokens.
    #[error("a request must name at least one token")]
    NoItems,

    /// The request names more distinct tokens than allowed.
    #[error("a request may name at most {max} tokens, got {actual}")]
    TooManyItems {
        /// Configured maximum
        max: usize,

        /// Distinct tokens requested
        actual: usize,
    },

    /// The purpose is blank.
    #[error("purpose must not be empty")]
    EmptyPurpose,

    /// The purpose exceeds the configured length.
    #[error("purpose is limited to {max} characters, got {actual}")]
    PurposeTooLong {
        /// Configured maximum
        max: usize,

        /// Characters supplied
        actual: usize,
    },

    /// The comment exceeds the configured length.
    #[error("comment is limited to {max} characters, got {actual}")]
    CommentTooLong {
        /// Configured maximum
        max: usize,

        /// Characters supplied
        actual: usize,
    },
}

/// Bounds applied to every new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Maximum distinct tokens per request.
    pub max_items: usize,

    /// Maximum purpose length in characters.
    pub max_purpose_len: usize,

    /// Maximum comment length in characters.
    pub max_comment_len: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_items: 5,
            max_purpose_len: 500,
            max_comment_len: 300,
        }
    }
}

impl RequestLimits {
    /// Check deduplicated items, purpose and comment against the limits.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(
        &self,
        items: &[RequestItem],
        purpose: &str,
        comment: Option<&str>,
    ) -> Result<(), ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        if items.len() > self.max_items {
            return Err(ValidationError::TooManyItems {
                max: self.max_items,
                actual: items.len(),
            });
        }

        if purpose.trim().is_empty() {
            return Err(ValidationError::EmptyPurpose);
        }

        let purpose_len = purpose.chars().count();

        if purpose_len > self.max_purpose_len {
            return Err(ValidationError::PurposeTooLong {
                max: self.max_purpose_len,
                actual: purpose_len,
            });
        }

        if let Some(comment) = comment {
            let comment_len = comment.chars().count();

            if comment_len > self.max_comment_len {
                return Err(ValidationError::CommentTooLong {
                    max: self.max_comment_len,
                    actual: comment_len,
                });
            }
        }

        Ok(())
    }
}

/// Trim a free-text comment, treating a blank one as absent.
#[must_use]
pub fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
