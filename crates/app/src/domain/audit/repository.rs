//! Audit Repository

use custody::{audit::AuditAction, ids::UserId};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::{
    database::try_get_parsed,
    domain::{
        audit::records::{AuditEntryId, AuditEntryRecord},
        requests::records::RequestId,
    },
};

const APPEND_AUDIT_ENTRY_SQL: &str = include_str!("sql/append_audit_entry.sql");
const LIST_AUDIT_ENTRIES_SQL: &str = include_str!("sql/list_audit_entries.sql");
const DELETE_AUDIT_ENTRIES_SQL: &str = include_str!("sql/delete_audit_entries.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAuditRepository;

impl PgAuditRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Append one entry inside the caller's unit of work.
    pub(crate) async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: Option<RequestId>,
        actor: UserId,
        action: AuditAction,
        payload: &Value,
    ) -> Result<AuditEntryRecord, sqlx::Error> {
        query_as::<Postgres, AuditEntryRecord>(APPEND_AUDIT_ENTRY_SQL)
            .bind(request.map(RequestId::get))
            .bind(actor.get())
            .bind(action.as_str())
            .bind(Json(payload))
            .fetch_one(&mut **tx)
            .await
    }

    /// Most recent entries first, optionally restricted to one request.
    pub(crate) async fn list(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: Option<RequestId>,
        limit: i64,
    ) -> Result<Vec<AuditEntryRecord>, sqlx::Error> {
        query_as::<Postgres, AuditEntryRecord>(LIST_AUDIT_ENTRIES_SQL)
            .bind(request.map(RequestId::get))
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn delete_for_requests(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        requests: &[RequestId],
    ) -> Result<u64, sqlx::Error> {
        let ids: Vec<i64> = requests.iter().map(|id| id.get()).collect();

        let rows_affected = query(DELETE_AUDIT_ENTRIES_SQL)
            .bind(&ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for AuditEntryRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: AuditEntryId::from_i64(row.try_get("id")?),
            ts: row.try_get::<SqlxTimestamp, _>("ts")?.to_jiff(),
            request_id: row
                .try_get::<Option<i64>, _>("request_id")?
                .map(RequestId::from_i64),
            actor_id: UserId::new(row.try_get("actor_id")?),
            action: try_get_parsed(row, "action")?,
            payload: row.try_get::<Json<Value>, _>("payload")?.0,
        })
    }
}
