//! Profiles Repository

use custody::ids::UserId;
use sqlx::{Postgres, Transaction, query, query_scalar};

const GET_PROFILE_NAME_SQL: &str = include_str!("sql/get_profile_name.sql");
const UPSERT_PROFILE_NAME_SQL: &str = include_str!("sql/upsert_profile_name.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProfilesRepository;

impl PgProfilesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_name(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
    ) -> Result<Option<String>, sqlx::Error> {
        query_scalar::<Postgres, String>(GET_PROFILE_NAME_SQL)
            .bind(user.get())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn upsert_name(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserId,
        name: &str,
    ) -> Result<(), sqlx::Error> {
        query(UPSERT_PROFILE_NAME_SQL)
            .bind(user.get())
            .bind(name)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
