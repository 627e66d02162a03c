//! Waitlist service.

use async_trait::async_trait;
use custody::ids::{TokenId, UserId};
use mockall::automock;
use tracing::debug;

use crate::{
    database::Db,
    domain::waitlist::{
        errors::WaitlistServiceError, records::WaitlistEntry, repository::PgWaitlistRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgWaitlistService {
    db: Db,
    repository: PgWaitlistRepository,
}

impl PgWaitlistService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgWaitlistRepository::new(),
        }
    }
}

#[async_trait]
impl WaitlistService for PgWaitlistService {
    #[tracing::instrument(
        name = "waitlist.service.join",
        skip_all,
        fields(requester_id = %requester, token_id = %token),
        err
    )]
    async fn join(
        &self,
        requester: UserId,
        token: &TokenId,
        company: &str,
    ) -> Result<bool, WaitlistServiceError> {
        let mut tx = self.db.begin().await?;

        let joined_now = self
            .repository
            .join(&mut tx, requester, token, company)
            .await?;

        tx.commit().await?;

        debug!(joined_now, "waitlist join");

        Ok(joined_now)
    }

    async fn list_for_user(
        &self,
        requester: UserId,
    ) -> Result<Vec<WaitlistEntry>, WaitlistServiceError> {
        let mut tx = self.db.begin().await?;

        let entries = self.repository.list_for_user(&mut tx, requester).await?;

        tx.commit().await?;

        Ok(entries)
    }

    #[tracing::instrument(
        name = "waitlist.service.pop_available",
        skip(self, tokens),
        fields(token_count = tokens.len()),
        err
    )]
    async fn pop_available(
        &self,
        tokens: &[TokenId],
    ) -> Result<Vec<WaitlistEntry>, WaitlistServiceError> {
        let mut tx = self.db.begin().await?;

        let entries = self.repository.pop_available(&mut tx, tokens).await?;

        tx.commit().await?;

        debug!(popped = entries.len(), "drained waitlist");

        Ok(entries)
    }
}

#[automock]
#[async_trait]
pub trait WaitlistService: Send + Sync {
    /// Register interest in a token. Returns `false` if the requester was already waiting on it.
    async fn join(
        &self,
        requester: UserId,
        token: &TokenId,
        company: &str,
    ) -> Result<bool, WaitlistServiceError>;

    /// Every token the requester is waiting on, oldest registration first.
    async fn list_for_user(
        &self,
        requester: UserId,
    ) -> Result<Vec<WaitlistEntry>, WaitlistServiceError>;

    /// Remove and return all waiters on those of `tokens` that are currently available.
    ///
    /// The tokens are not reserved for anyone: waiting only earns a notification.
    async fn pop_available(
        &self,
        tokens: &[TokenId],
    ) -> Result<Vec<WaitlistEntry>, WaitlistServiceError>;
}
