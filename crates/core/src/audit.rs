//! Audit actions

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::status::ParseStatusError;

/// The kind of state change an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// A request was created and its tokens reserved.
    Requested,

    /// The approver authorised a request.
    Approved,

    /// The approver denied a request.
    Rejected,

    /// The custodian handed the tokens over.
    Issued,

    /// The custodian received the tokens back.
    Returned,

    /// An administrator force-deleted a request outside the normal lifecycle.
    AdminDeleted,
}

impl AuditAction {
    /// Every audit action.
    pub const ALL: [Self; 6] = [
        Self::Requested,
        Self::Approved,
        Self::Rejected,
        Self::Issued,
        Self::Returned,
        Self::AdminDeleted,
    ];

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Issued => "ISSUED",
            Self::Returned => "RETURNED",
            Self::AdminDeleted => "ADMIN_DELETED",
        }
    }
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                kind: "audit action",
                value: s.to_string(),
            })
    }
}
