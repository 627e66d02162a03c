//! Audit service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        audit::{
            errors::AuditServiceError, records::AuditEntryRecord, repository::PgAuditRepository,
        },
        requests::records::RequestId,
    },
};

#[derive(Debug, Clone)]
pub struct PgAuditService {
    db: Db,
    repository: PgAuditRepository,
}

impl PgAuditService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAuditRepository::new(),
        }
    }
}

#[async_trait]
impl AuditService for PgAuditService {
    async fn query(
        &self,
        request: Option<RequestId>,
        limit: u32,
    ) -> Result<Vec<AuditEntryRecord>, AuditServiceError> {
        let mut tx = self.db.begin().await?;

        let entries = self
            .repository
            .list(&mut tx, request, i64::from(limit))
            .await?;

        tx.commit().await?;

        Ok(entries)
    }
}

#[automock]
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Audit entries, most recent first. `None` returns entries for every request.
    async fn query(
        &self,
        request: Option<RequestId>,
        limit: u32,
    ) -> Result<Vec<AuditEntryRecord>, AuditServiceError>;
}
