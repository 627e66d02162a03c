//! Custody
//!
//! Custody is the storage-free domain core of a signing-token checkout ledger: token and
//! request statuses, the cooperative request lifecycle, request item rules and the injected
//! company→token catalog.

pub mod audit;
pub mod catalog;
pub mod ids;
pub mod items;
pub mod prelude;
pub mod status;
pub mod transition;
