//! Custody prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    audit::AuditAction,
    catalog::{Catalog, CatalogEntry, CatalogError},
    ids::{TokenId, UserId},
    items::{RequestItem, RequestLimits, ValidationError, dedupe_items, normalize_comment},
    status::{ParseStatusError, RequestStatus, TokenStatus},
    transition::{Transition, TransitionError},
};
