//! Token and request statuses

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use thiserror::Error;

/// A status string that does not name any known status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value:?}")]
pub struct ParseStatusError {
    /// Which status family was being parsed (`token` or `request`).
    pub kind: &'static str,

    /// The rejected input.
    pub value: String,
}

/// Physical token status.
///
/// The status alone determines whether a request currently holds the token:
/// `Reserved` and `Issued` are held, `Available` is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStatus {
    /// Free for any new request.
    Available,

    /// Held by a request that has not been handed over yet.
    Reserved,

    /// Physically handed over to the requester.
    Issued,
}

impl TokenStatus {
    /// Every token status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Available, Self::Reserved, Self::Issued];

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Issued => "issued",
        }
    }

    /// Whether some request currently holds a token in this status.
    #[must_use]
    pub const fn is_held(self) -> bool {
        !matches!(self, Self::Available)
    }
}

impl Display for TokenStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError {
                kind: "token",
                value: s.to_string(),
            })
    }
}

/// Request lifecycle status.
///
/// `Requested → {Approved → {Issued → Returned}, Rejected}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    /// Submitted, waiting for the approver.
    Requested,

    /// Authorised, waiting for the custodian to hand over the tokens.
    Approved,

    /// Denied by the approver. Terminal.
    Rejected,

    /// Tokens handed over to the requester.
    Issued,

    /// Tokens received back by the custodian. Terminal.
    Returned,
}

impl RequestStatus {
    /// Every request status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Requested,
        Self::Approved,
        Self::Rejected,
        Self::Issued,
        Self::Returned,
    ];

    /// Statuses from which no forward transition exists.
    pub const TERMINAL: [Self; 2] = [Self::Rejected, Self::Returned];

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Issued => "ISSUED",
            Self::Returned => "RETURNED",
        }
    }

    /// Whether the request can no longer move forward.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Returned)
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError {
                kind: "request",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn token_status_parses_storage_strings() -> TestResult {
        for status in TokenStatus::ALL {
            assert_eq!(status.as_str().parse::<TokenStatus>()?, status);
        }

        assert_eq!("  Reserved ".parse::<TokenStatus>()?, TokenStatus::Reserved);

        Ok(())
    }

    #[test]
    fn request_status_parse_is_case_insensitive() -> TestResult {
        assert_eq!("approved".parse::<RequestStatus>()?, RequestStatus::Approved);
        assert_eq!("RETURNED".parse::<RequestStatus>()?, RequestStatus::Returned);

        Ok(())
    }

    #[test]
    fn unknown_status_reports_kind_and_value() {
        let error = "lost".parse::<TokenStatus>().err();

        assert_eq!(
            error,
            Some(ParseStatusError {
                kind: "token",
                value: "lost".to_string(),
            })
        );
    }

    #[test]
    fn only_rejected_and_returned_are_terminal() {
        let terminal: Vec<RequestStatus> = RequestStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();

        assert_eq!(terminal, RequestStatus::TERMINAL);
    }

    #[test]
    fn available_is_the_only_free_token_status() {
        assert!(!TokenStatus::Available.is_held());
        assert!(TokenStatus::Reserved.is_held());
        assert!(TokenStatus::Issued.is_held());
    }
}
