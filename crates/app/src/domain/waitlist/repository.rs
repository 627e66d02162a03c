//! Waitlist Repository

use custody::ids::{TokenId, UserId};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::waitlist::records::WaitlistEntry;

const JOIN_WAITLIST_SQL: &str = include_str!("sql/join_waitlist.sql");
const LIST_WAITLIST_FOR_USER_SQL: &str = include_str!("sql/list_waitlist_for_user.sql");
const POP_AVAILABLE_WAITLIST_SQL: &str = include_str!("sql/pop_available_waitlist.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgWaitlistRepository;

impl PgWaitlistRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Returns `false` when the requester was already waiting on the token.
    pub(crate) async fn join(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        requester: UserId,
        token: &TokenId,
        company: &str,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(JOIN_WAITLIST_SQL)
            .bind(requester.get())
            .bind(token.as_str())
            .bind(company)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    pub(crate) async fn list_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        requester: UserId,
    ) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
        query_as::<Postgres, WaitlistEntry>(LIST_WAITLIST_FOR_USER_SQL)
            .bind(requester.get())
            .fetch_all(&mut **tx)
            .await
    }

    /// Remove and return every waiter on those of `tokens` that are available, oldest first.
    pub(crate) async fn pop_available(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tokens: &[TokenId],
    ) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let token_ids: Vec<&str> = tokens.iter().map(TokenId::as_str).collect();

        let mut entries = query_as::<Postgres, WaitlistEntry>(POP_AVAILABLE_WAITLIST_SQL)
            .bind(&token_ids)
            .fetch_all(&mut **tx)
            .await?;

        // DELETE .. RETURNING has no ORDER BY.
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.token_id.cmp(&b.token_id))
        });

        Ok(entries)
    }
}

impl<'r> FromRow<'r, PgRow> for WaitlistEntry {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            requester_id: UserId::new(row.try_get("requester_id")?),
            token_id: TokenId::new(row.try_get::<String, _>("token_id")?),
            company: row.try_get("company")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
