//! Transitions service errors.

use std::num::TryFromIntError;

use custody::{
    ids::TokenId,
    items::ValidationError,
    status::RequestStatus,
    transition::TransitionError,
};
use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionsServiceError {
    #[error("request not found")]
    NotFound,

    #[error("operation not allowed for a request in status {status}")]
    InvalidState { status: RequestStatus },

    /// Another unit of work moved the request first.
    #[error("request was changed concurrently")]
    RaceLost,

    #[error("token {0} not found")]
    TokenNotFound(TokenId),

    #[error("token {0} is not available")]
    TokenNotAvailable(TokenId),

    /// The token was taken between the availability check and the reservation.
    #[error("token {0} could not be reserved")]
    TokenReserveFailed(TokenId),

    /// A token held by the request was not in the status the request implies.
    #[error("token {0} is not in the expected status")]
    TokenStatusMismatch(TokenId),

    #[error("invalid request")]
    Validation(#[from] ValidationError),

    #[error("invalid retention period")]
    InvalidRetention(#[from] TryFromIntError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl TransitionsServiceError {
    /// Whether the error signals corrupted state rather than a recoverable condition.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TokenStatusMismatch(_))
    }
}

impl From<TransitionError> for TransitionsServiceError {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::InvalidState { status, .. } => Self::InvalidState { status },
        }
    }
}

impl From<Error> for TransitionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}
