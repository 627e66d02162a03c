//! Tokens service.

use async_trait::async_trait;
use custody::{catalog::Catalog, ids::TokenId, status::TokenStatus};
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::tokens::{
        errors::TokensServiceError, records::TokenRecord, repository::PgTokensRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgTokensService {
    db: Db,
    repository: PgTokensRepository,
}

impl PgTokensService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgTokensRepository::new(),
        }
    }
}

#[async_trait]
impl TokensService for PgTokensService {
    async fn get_token(&self, token: &TokenId) -> Result<TokenRecord, TokensServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .find_token(&mut tx, token)
            .await?
            .ok_or(TokensServiceError::NotFound)?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_tokens(&self) -> Result<Vec<TokenRecord>, TokensServiceError> {
        let mut tx = self.db.begin().await?;

        let tokens = self.repository.list_tokens(&mut tx).await?;

        tx.commit().await?;

        Ok(tokens)
    }

    async fn list_by_status(
        &self,
        status: TokenStatus,
    ) -> Result<Vec<TokenRecord>, TokensServiceError> {
        let mut tx = self.db.begin().await?;

        let tokens = self.repository.list_tokens_by_status(&mut tx, status).await?;

        tx.commit().await?;

        Ok(tokens)
    }

    #[tracing::instrument(name = "tokens.service.seed_catalog", skip(self, catalog), err)]
    async fn seed_catalog(&self, catalog: &Catalog) -> Result<u64, TokensServiceError> {
        let mut tx = self.db.begin().await?;

        let inserted = self
            .repository
            .seed_tokens(&mut tx, catalog.entries())
            .await?;

        tx.commit().await?;

        info!(
            inserted,
            catalog_size = catalog.entries().len(),
            "seeded token catalog"
        );

        Ok(inserted)
    }
}

#[automock]
#[async_trait]
pub trait TokensService: Send + Sync {
    /// Retrieve a single token.
    async fn get_token(&self, token: &TokenId) -> Result<TokenRecord, TokensServiceError>;

    /// Retrieve every token, ordered by id.
    async fn list_tokens(&self) -> Result<Vec<TokenRecord>, TokensServiceError>;

    /// Retrieve the tokens currently in the given status.
    async fn list_by_status(
        &self,
        status: TokenStatus,
    ) -> Result<Vec<TokenRecord>, TokensServiceError>;

    /// Insert catalog tokens that do not exist yet as available. Returns how many were added.
    async fn seed_catalog(&self, catalog: &Catalog) -> Result<u64, TokensServiceError>;
}
