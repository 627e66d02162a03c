//! Tokens Repository

use async_trait::async_trait;
use custody::{catalog::CatalogEntry, ids::TokenId, status::TokenStatus};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use tracing::debug;

use crate::{
    database::{CompareAndSwapStatus, try_get_count, try_get_parsed},
    domain::tokens::records::TokenRecord,
};

const GET_TOKEN_SQL: &str = include_str!("sql/get_token.sql");
const LIST_TOKENS_SQL: &str = include_str!("sql/list_tokens.sql");
const LIST_TOKENS_BY_STATUS_SQL: &str = include_str!("sql/list_tokens_by_status.sql");
const COMPARE_AND_SWAP_TOKEN_STATUS_SQL: &str =
    include_str!("sql/compare_and_swap_token_status.sql");
const FORCE_TOKEN_STATUS_SQL: &str = include_str!("sql/force_token_status.sql");
const SEED_TOKENS_SQL: &str = include_str!("sql/seed_tokens.sql");
const COUNT_TOKENS_BY_STATUS_SQL: &str = include_str!("sql/count_tokens_by_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgTokensRepository;

impl PgTokensRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &TokenId,
    ) -> Result<Option<TokenRecord>, sqlx::Error> {
        query_as::<Postgres, TokenRecord>(GET_TOKEN_SQL)
            .bind(token.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_tokens(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<TokenRecord>, sqlx::Error> {
        query_as::<Postgres, TokenRecord>(LIST_TOKENS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_tokens_by_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: TokenStatus,
    ) -> Result<Vec<TokenRecord>, sqlx::Error> {
        query_as::<Postgres, TokenRecord>(LIST_TOKENS_BY_STATUS_SQL)
            .bind(status.as_str())
            .fetch_all(&mut **tx)
            .await
    }

    /// Set a token's status without checking what it was. Reserved for administrative release.
    pub(crate) async fn force_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &TokenId,
        status: TokenStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(FORCE_TOKEN_STATUS_SQL)
            .bind(token.as_str())
            .bind(status.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    #[tracing::instrument(
        name = "tokens.repository.seed_tokens",
        skip(self, tx, entries),
        fields(entry_count = entries.len()),
        err
    )]
    pub(crate) async fn seed_tokens(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entries: &[CatalogEntry],
    ) -> Result<u64, sqlx::Error> {
        if entries.is_empty() {
            return Ok(0);
        }

        let token_ids: Vec<String> = entries
            .iter()
            .map(|entry| entry.token_id.as_str().to_owned())
            .collect();

        let descriptions: Vec<String> = entries.iter().map(CatalogEntry::description).collect();

        let inserted = query(SEED_TOKENS_SQL)
            .bind(&token_ids)
            .bind(&descriptions)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        debug!(inserted, "seeded tokens");

        Ok(inserted)
    }

    pub(crate) async fn count_by_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<(TokenStatus, u64)>, sqlx::Error> {
        let rows = query(COUNT_TOKENS_BY_STATUS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        let mut counts: Vec<(TokenStatus, u64)> =
            TokenStatus::ALL.into_iter().map(|status| (status, 0)).collect();

        for row in &rows {
            let status: TokenStatus = try_get_parsed(row, "status")?;
            let count = try_get_count(row, "count")?;

            if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == status) {
                slot.1 = count;
            }
        }

        Ok(counts)
    }
}

#[async_trait]
impl CompareAndSwapStatus for PgTokensRepository {
    type Id = TokenId;
    type Status = TokenStatus;

    async fn compare_and_swap_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: &TokenId,
        expected: TokenStatus,
        next: TokenStatus,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(COMPARE_AND_SWAP_TOKEN_STATUS_SQL)
            .bind(id.as_str())
            .bind(expected.as_str())
            .bind(next.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }
}

impl<'r> FromRow<'r, PgRow> for TokenRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            token_id: TokenId::new(row.try_get::<String, _>("token_id")?),
            description: row.try_get("description")?,
            status: try_get_parsed(row, "status")?,
        })
    }
}
