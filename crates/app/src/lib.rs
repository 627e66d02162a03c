//! Persistence, services and configuration for the signing-token custody ledger.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod ids;

#[cfg(test)]
mod test;
