//! Application configuration
//!
//! Every setting can come from a command-line flag or the environment; `.env` is loaded first.

use std::path::PathBuf;

use clap::Args;

pub mod db;
pub mod limits;
pub mod logging;

pub use db::DatabaseConfig;
pub use limits::LimitsConfig;
pub use logging::{LogFormat, LoggingConfig};

/// Settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Company to token catalog used to seed tokens and resolve company names
    #[arg(long, env = "CATALOG_PATH", default_value = "catalog.yaml")]
    pub catalog_path: PathBuf,

    /// Bounds applied to new requests.
    #[command(flatten)]
    pub limits: LimitsConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Load `.env` into the process environment if present.
pub fn load_dotenv() {
    _ = dotenvy::dotenv();
}
