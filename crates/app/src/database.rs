//! Database connection management

use std::{error::Error as StdError, str::FromStr};

use async_trait::async_trait;
use sqlx::{
    PgPool, Postgres, Row, Transaction,
    migrate::MigrateError,
    postgres::{PgPoolOptions, PgRow},
};

/// Maximum pooled connections held by one process.
pub const MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin one atomic unit of work.
    ///
    /// The returned transaction must be committed explicitly. Dropping it on any other exit
    /// path (early return, error, panic) rolls it back and returns the connection to the pool.
    ///
    /// # Errors
    ///
    /// Returns an error when no connection can be acquired or `BEGIN` fails.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Conditional status update: the sole optimistic-concurrency primitive.
///
/// Implementors move one row from `expected` to `next` and report whether exactly one row
/// transitioned. A `false` result means some other unit of work changed the row first.
#[async_trait]
pub(crate) trait CompareAndSwapStatus: Send + Sync {
    type Id: Send + Sync;
    type Status: Copy + Send + Sync;

    async fn compare_and_swap_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: &Self::Id,
        expected: Self::Status,
        next: Self::Status,
    ) -> Result<bool, sqlx::Error>;
}

/// Decode a text column through its `FromStr` implementation.
pub(crate) fn try_get_parsed<T>(row: &PgRow, col: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    let raw: String = row.try_get(col)?;

    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Decode a non-negative `BIGINT` count.
pub(crate) fn try_get_count(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let count: i64 = row.try_get(col)?;

    u64::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Apply pending schema migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
