//! Audit service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditServiceError {
    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}
