//! Audit Records

use custody::{audit::AuditAction, ids::UserId};
use jiff::Timestamp;
use serde_json::Value;

use crate::{domain::requests::records::RequestId, ids::TypedId};

/// Audit Entry Id
pub type AuditEntryId = TypedId<AuditEntryRecord>;

/// One immutable line of the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntryRecord {
    pub id: AuditEntryId,
    pub ts: Timestamp,

    /// `None` for entries that outlive their request, such as administrative deletions.
    pub request_id: Option<RequestId>,

    pub actor_id: UserId,
    pub action: AuditAction,

    /// Opaque structured context; never interpreted by the ledger.
    pub payload: Value,
}
