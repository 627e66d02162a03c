//! Cooperative request lifecycle.
//!
//! Every forward edge of the request state machine is a [`Transition`]. A transition moves the
//! request from exactly one status to exactly one other status, and moves every token the
//! request holds from one token status to another, in the same unit of work.
//!
//! Administrative deletion is not a transition: it bypasses this table entirely.

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::{
    audit::AuditAction,
    status::{RequestStatus, TokenStatus},
};

/// A transition attempted from a status that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The request is not in the status the transition starts from.
    #[error("cannot {transition} a request in status {status}")]
    InvalidState {
        /// The attempted transition.
        transition: Transition,

        /// The status the request was found in.
        status: RequestStatus,
    },
}

/// A forward edge of the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// `Requested → Approved`; tokens stay `Reserved`.
    Approve,

    /// `Requested → Rejected`; tokens go back to `Available`.
    Reject,

    /// `Approved → Issued`; tokens go `Reserved → Issued`.
    Issue,

    /// `Issued → Returned`; tokens go `Issued → Available`.
    Return,
}

impl Transition {
    /// The approver's decision as a transition.
    #[must_use]
    pub const fn decision(approve: bool) -> Self {
        if approve { Self::Approve } else { Self::Reject }
    }

    /// Request status the transition starts from.
    #[must_use]
    pub const fn from_status(self) -> RequestStatus {
        match self {
            Self::Approve | Self::Reject => RequestStatus::Requested,
            Self::Issue => RequestStatus::Approved,
            Self::Return => RequestStatus::Issued,
        }
    }

    /// Request status the transition ends in.
    #[must_use]
    pub const fn to_status(self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
            Self::Issue => RequestStatus::Issued,
            Self::Return => RequestStatus::Returned,
        }
    }

    /// Status every item token must be in before the transition.
    #[must_use]
    pub const fn token_from(self) -> TokenStatus {
        match self {
            Self::Approve | Self::Reject | Self::Issue => TokenStatus::Reserved,
            Self::Return => TokenStatus::Issued,
        }
    }

    /// Status every item token is moved to.
    #[must_use]
    pub const fn token_to(self) -> TokenStatus {
        match self {
            Self::Approve => TokenStatus::Reserved,
            Self::Reject | Self::Return => TokenStatus::Available,
            Self::Issue => TokenStatus::Issued,
        }
    }

    /// Whether the transition frees the request's tokens.
    #[must_use]
    pub const fn releases_tokens(self) -> bool {
        matches!(self.token_to(), TokenStatus::Available)
    }

    /// The audit action recorded when the transition commits.
    #[must_use]
    pub const fn audit_action(self) -> AuditAction {
        match self {
            Self::Approve => AuditAction::Approved,
            Self::Reject => AuditAction::Rejected,
            Self::Issue => AuditAction::Issued,
            Self::Return => AuditAction::Returned,
        }
    }

    /// Validate the edge from `status`, returning the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidState`] when `status` is not [`Self::from_status`].
    pub fn apply(self, status: RequestStatus) -> Result<RequestStatus, TransitionError> {
        if status == self.from_status() {
            Ok(self.to_status())
        } else {
            Err(TransitionError::InvalidState {
                transition: self,
                status,
            })
        }
    }

    /// Verb used in messages and span names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Issue => "issue",
            Self::Return => "return",
        }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
