//! Ledger service errors.

use std::num::TryFromIntError;

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerServiceError {
    #[error("request not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("invalid interval value")]
    InvalidInterval(#[from] TryFromIntError),
}

impl From<Error> for LedgerServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}
