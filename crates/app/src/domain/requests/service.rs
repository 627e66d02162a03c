//! Requests ledger service: read projections over requests and their items.

use async_trait::async_trait;
use custody::{ids::UserId, status::RequestStatus};
use mockall::automock;
use tracing::debug;

use crate::{
    database::Db,
    domain::{
        requests::{
            errors::LedgerServiceError,
            records::{LedgerStatistics, RequestId, RequestItemRecord, RequestRecord},
            repository::PgRequestsRepository,
        },
        tokens::repository::PgTokensRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgLedgerService {
    db: Db,
    repository: PgRequestsRepository,
    tokens: PgTokensRepository,
}

impl PgLedgerService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgRequestsRepository::new(),
            tokens: PgTokensRepository::new(),
        }
    }
}

#[async_trait]
impl LedgerService for PgLedgerService {
    async fn get_request(&self, id: RequestId) -> Result<RequestRecord, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .find_request(&mut tx, id)
            .await?
            .ok_or(LedgerServiceError::NotFound)?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_request_items(
        &self,
        id: RequestId,
    ) -> Result<Vec<RequestItemRecord>, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        if self.repository.find_request(&mut tx, id).await?.is_none() {
            return Err(LedgerServiceError::NotFound);
        }

        let items = self.repository.get_items(&mut tx, id).await?;

        tx.commit().await?;

        Ok(items)
    }

    async fn list_by_status(
        &self,
        status: RequestStatus,
        limit: u32,
    ) -> Result<Vec<RequestRecord>, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        let requests = self
            .repository
            .list_by_status(&mut tx, status, i64::from(limit))
            .await?;

        tx.commit().await?;

        Ok(requests)
    }

    async fn list_by_requester(
        &self,
        requester: UserId,
        limit: u32,
    ) -> Result<Vec<RequestRecord>, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        let requests = self
            .repository
            .list_by_requester(&mut tx, requester, i64::from(limit))
            .await?;

        tx.commit().await?;

        Ok(requests)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<RequestRecord>, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        let requests = self.repository.list_recent(&mut tx, i64::from(limit)).await?;

        tx.commit().await?;

        Ok(requests)
    }

    async fn statistics(&self) -> Result<LedgerStatistics, LedgerServiceError> {
        let mut tx = self.db.begin().await?;

        let requests_by_status = self.repository.count_by_status(&mut tx).await?;
        let tokens_by_status = self.tokens.count_by_status(&mut tx).await?;
        let distinct_requesters = self.repository.count_requesters(&mut tx).await?;

        tx.commit().await?;

        Ok(LedgerStatistics {
            requests_by_status,
            tokens_by_status,
            distinct_requesters,
        })
    }

    async fn pending_for_remind(
        &self,
        after_minutes: u32,
        repeat_minutes: u32,
    ) -> Result<Vec<RequestRecord>, LedgerServiceError> {
        let after_minutes = i32::try_from(after_minutes)?;
        let repeat_minutes = i32::try_from(repeat_minutes)?;

        let mut tx = self.db.begin().await?;

        let requests = self
            .repository
            .pending_for_remind(&mut tx, after_minutes, repeat_minutes)
            .await?;

        tx.commit().await?;

        Ok(requests)
    }

    #[tracing::instrument(
        name = "ledger.service.mark_reminded",
        skip(self, ids),
        fields(request_count = ids.len()),
        err
    )]
    async fn mark_reminded(&self, ids: &[RequestId]) -> Result<u64, LedgerServiceError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;

        let marked = self.repository.mark_reminded(&mut tx, ids).await?;

        tx.commit().await?;

        debug!(marked, "marked requests as reminded");

        Ok(marked)
    }
}

#[automock]
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Retrieve a single request.
    async fn get_request(&self, id: RequestId) -> Result<RequestRecord, LedgerServiceError>;

    /// Retrieve the items of a request, ordered by token id.
    async fn get_request_items(
        &self,
        id: RequestId,
    ) -> Result<Vec<RequestItemRecord>, LedgerServiceError>;

    /// Requests currently in `status`, newest first.
    async fn list_by_status(
        &self,
        status: RequestStatus,
        limit: u32,
    ) -> Result<Vec<RequestRecord>, LedgerServiceError>;

    /// Requests submitted by `requester`, newest first.
    async fn list_by_requester(
        &self,
        requester: UserId,
        limit: u32,
    ) -> Result<Vec<RequestRecord>, LedgerServiceError>;

    /// The most recent requests of any status, newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<RequestRecord>, LedgerServiceError>;

    /// Counters over requests and tokens.
    async fn statistics(&self) -> Result<LedgerStatistics, LedgerServiceError>;

    /// Undecided requests that are due a reminder to the approver, oldest first.
    ///
    /// A request is due once it has waited `after_minutes`, and again every `repeat_minutes`
    /// after the previous reminder.
    async fn pending_for_remind(
        &self,
        after_minutes: u32,
        repeat_minutes: u32,
    ) -> Result<Vec<RequestRecord>, LedgerServiceError>;

    /// Record that a reminder was just sent for each of `ids`.
    async fn mark_reminded(&self, ids: &[RequestId]) -> Result<u64, LedgerServiceError>;
}
