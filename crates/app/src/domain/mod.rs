//! Custody Domain Concerns

pub mod audit;
pub mod profiles;
pub mod requests;
pub mod tokens;
pub mod transitions;
pub mod waitlist;
