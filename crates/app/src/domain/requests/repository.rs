//! Requests Repository

use async_trait::async_trait;
use custody::{
    ids::{TokenId, UserId},
    status::RequestStatus,
};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::{CompareAndSwapStatus, try_get_count, try_get_parsed},
    domain::requests::{
        data::NewRequest,
        records::{RequestId, RequestItemRecord, RequestRecord},
    },
};

const INSERT_REQUEST_SQL: &str = include_str!("sql/insert_request.sql");
const INSERT_REQUEST_ITEMS_SQL: &str = include_str!("sql/insert_request_items.sql");
const GET_REQUEST_SQL: &str = include_str!("sql/get_request.sql");
const GET_REQUEST_ITEMS_SQL: &str = include_str!("sql/get_request_items.sql");
const COMPARE_AND_SWAP_REQUEST_STATUS_SQL: &str =
    include_str!("sql/compare_and_swap_request_status.sql");
const STAMP_TRANSITION_SQL: &str = include_str!("sql/stamp_transition.sql");
const LIST_REQUESTS_BY_STATUS_SQL: &str = include_str!("sql/list_requests_by_status.sql");
const LIST_REQUESTS_BY_REQUESTER_SQL: &str = include_str!("sql/list_requests_by_requester.sql");
const LIST_RECENT_REQUESTS_SQL: &str = include_str!("sql/list_recent_requests.sql");
const COUNT_REQUESTS_BY_STATUS_SQL: &str = include_str!("sql/count_requests_by_status.sql");
const COUNT_REQUESTERS_SQL: &str = include_str!("sql/count_requesters.sql");
const PENDING_FOR_REMIND_SQL: &str = include_str!("sql/pending_for_remind.sql");
const MARK_REMINDED_SQL: &str = include_str!("sql/mark_reminded.sql");
const LIST_PURGEABLE_REQUESTS_SQL: &str = include_str!("sql/list_purgeable_requests.sql");
const DELETE_REQUEST_ITEMS_SQL: &str = include_str!("sql/delete_request_items.sql");
const DELETE_REQUESTS_SQL: &str = include_str!("sql/delete_requests.sql");
const BACKFILL_DISPLAY_NAME_SQL: &str = include_str!("sql/backfill_display_name.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRequestsRepository;

impl PgRequestsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a request in `REQUESTED` status together with its items.
    pub(crate) async fn create_request(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: &NewRequest,
    ) -> Result<RequestRecord, sqlx::Error> {
        let record = query_as::<Postgres, RequestRecord>(INSERT_REQUEST_SQL)
            .bind(request.requester_id.get())
            .bind(request.requester_display_name.as_deref())
            .bind(&request.purpose)
            .bind(request.comment.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        let companies: Vec<&str> = request
            .items
            .iter()
            .map(|item| item.company.as_str())
            .collect();

        let token_ids: Vec<&str> = request
            .items
            .iter()
            .map(|item| item.token_id.as_str())
            .collect();

        query(INSERT_REQUEST_ITEMS_SQL)
            .bind(record.id.get())
            .bind(&companies)
            .bind(&token_ids)
            .execute(&mut **tx)
            .await?;

        Ok(record)
    }

    pub(crate) async fn find_request(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: RequestId,
    ) -> Result<Option<RequestRecord>, sqlx::Error> {
        query_as::<Postgres, RequestRecord>(GET_REQUEST_SQL)
            .bind(id.get())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Items of one request, ordered by token id.
    pub(crate) async fn get_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: RequestId,
    ) -> Result<Vec<RequestItemRecord>, sqlx::Error> {
        query_as::<Postgres, RequestItemRecord>(GET_REQUEST_ITEMS_SQL)
            .bind(id.get())
            .fetch_all(&mut **tx)
            .await
    }

    /// Record who performed the transition into `status` and when, returning the updated row.
    pub(crate) async fn stamp_transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: RequestId,
        status: RequestStatus,
        actor: UserId,
    ) -> Result<RequestRecord, sqlx::Error> {
        query_as::<Postgres, RequestRecord>(STAMP_TRANSITION_SQL)
            .bind(id.get())
            .bind(status.as_str())
            .bind(actor.get())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_by_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: RequestStatus,
        limit: i64,
    ) -> Result<Vec<RequestRecord>, sqlx::Error> {
        query_as::<Postgres, RequestRecord>(LIST_REQUESTS_BY_STATUS_SQL)
            .bind(status.as_str())
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_by_requester(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        requester: UserId,
        limit: i64,
    ) -> Result<Vec<RequestRecord>, sqlx::Error> {
        query_as::<Postgres, RequestRecord>(LIST_REQUESTS_BY_REQUESTER_SQL)
            .bind(requester.get())
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_recent(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        limit: i64,
    ) -> Result<Vec<RequestRecord>, sqlx::Error> {
        query_as::<Postgres, RequestRecord>(LIST_RECENT_REQUESTS_SQL)
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn count_by_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<(RequestStatus, u64)>, sqlx::Error> {
        let rows = query(COUNT_REQUESTS_BY_STATUS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        let mut counts: Vec<(RequestStatus, u64)> = RequestStatus::ALL
            .into_iter()
            .map(|status| (status, 0))
            .collect();

        for row in &rows {
            let status: RequestStatus = try_get_parsed(row, "status")?;
            let count = try_get_count(row, "count")?;

            if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == status) {
                slot.1 = count;
            }
        }

        Ok(counts)
    }

    pub(crate) async fn count_requesters(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<u64, sqlx::Error> {
        let row = query(COUNT_REQUESTERS_SQL).fetch_one(&mut **tx).await?;

        try_get_count(&row, "count")
    }

    pub(crate) async fn pending_for_remind(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        after_minutes: i32,
        repeat_minutes: i32,
    ) -> Result<Vec<RequestRecord>, sqlx::Error> {
        query_as::<Postgres, RequestRecord>(PENDING_FOR_REMIND_SQL)
            .bind(after_minutes)
            .bind(repeat_minutes)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn mark_reminded(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[RequestId],
    ) -> Result<u64, sqlx::Error> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let rows_affected = query(MARK_REMINDED_SQL)
            .bind(&ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Lock and return terminal requests submitted at least `days` days ago.
    pub(crate) async fn list_purgeable(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        days: i32,
    ) -> Result<Vec<RequestId>, sqlx::Error> {
        let ids = query_scalar::<Postgres, i64>(LIST_PURGEABLE_REQUESTS_SQL)
            .bind(days)
            .fetch_all(&mut **tx)
            .await?;

        Ok(ids.into_iter().map(RequestId::from_i64).collect())
    }

    pub(crate) async fn delete_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[RequestId],
    ) -> Result<u64, sqlx::Error> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let rows_affected = query(DELETE_REQUEST_ITEMS_SQL)
            .bind(&ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_requests(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[RequestId],
    ) -> Result<u64, sqlx::Error> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        let rows_affected = query(DELETE_REQUESTS_SQL)
            .bind(&ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Fill in a missing display name on every request of `requester`.
    pub(crate) async fn backfill_display_name(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        requester: UserId,
        name: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(BACKFILL_DISPLAY_NAME_SQL)
            .bind(requester.get())
            .bind(name)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

#[async_trait]
impl CompareAndSwapStatus for PgRequestsRepository {
    type Id = RequestId;
    type Status = RequestStatus;

    async fn compare_and_swap_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: &RequestId,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(COMPARE_AND_SWAP_REQUEST_STATUS_SQL)
            .bind(id.get())
            .bind(expected.as_str())
            .bind(next.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }
}

fn try_get_user(row: &PgRow, col: &str) -> Result<Option<UserId>, sqlx::Error> {
    Ok(row.try_get::<Option<i64>, _>(col)?.map(UserId::new))
}

fn try_get_timestamp(row: &PgRow, col: &str) -> Result<Option<jiff::Timestamp>, sqlx::Error> {
    Ok(row
        .try_get::<Option<SqlxTimestamp>, _>(col)?
        .map(SqlxTimestamp::to_jiff))
}

impl<'r> FromRow<'r, PgRow> for RequestRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: RequestId::from_i64(row.try_get("id")?),
            requester_id: UserId::new(row.try_get("requester_id")?),
            requester_display_name: row.try_get("requester_display_name")?,
            purpose: row.try_get("purpose")?,
            comment: row.try_get("comment")?,
            status: try_get_parsed(row, "status")?,
            requested_at: row.try_get::<SqlxTimestamp, _>("requested_at")?.to_jiff(),
            remind_sent_at: try_get_timestamp(row, "remind_sent_at")?,
            approved_by: try_get_user(row, "approved_by")?,
            approved_at: try_get_timestamp(row, "approved_at")?,
            issued_by: try_get_user(row, "issued_by")?,
            issued_at: try_get_timestamp(row, "issued_at")?,
            returned_by: try_get_user(row, "returned_by")?,
            returned_at: try_get_timestamp(row, "returned_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for RequestItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            request_id: RequestId::from_i64(row.try_get("request_id")?),
            company: row.try_get("company")?,
            token_id: TokenId::new(row.try_get::<String, _>("token_id")?),
        })
    }
}
