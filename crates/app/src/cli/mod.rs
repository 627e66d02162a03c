use std::sync::Arc;

use clap::{Parser, Subcommand};
use custody_app::{
    config::AppConfig,
    context::AppContext,
    domain::waitlist::LoggingNotifier,
};

mod admin;
mod audit;
mod catalog;
mod db;
mod output;
mod profile;
mod reminders;
mod request;
mod tokens;
mod waitlist;

#[derive(Debug, Parser)]
#[command(
    name = "custody-app",
    about = "Signing token custody ledger",
    long_about = None
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db(db::DbCommand),

    /// Token catalog
    Catalog(catalog::CatalogCommand),

    /// Token status
    Tokens(tokens::TokensCommand),

    /// Request lifecycle
    Request(request::RequestCommand),

    /// Waitlist queue
    Waitlist(waitlist::WaitlistCommand),

    /// Administrative overrides and retention
    Admin(admin::AdminCommand),

    /// Audit trail
    Audit(audit::AuditCommand),

    /// Requester display names
    Profile(profile::ProfileCommand),

    /// Approver reminders
    Reminders(reminders::RemindersCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let Self { config, command } = self;

        match command {
            Commands::Db(command) => db::run(&config, command).await,
            Commands::Catalog(command) => catalog::run(&connect(&config).await?, command).await,
            Commands::Tokens(command) => tokens::run(&connect(&config).await?, command).await,
            Commands::Request(command) => request::run(&connect(&config).await?, command).await,
            Commands::Waitlist(command) => waitlist::run(&connect(&config).await?, command).await,
            Commands::Admin(command) => admin::run(&connect(&config).await?, command).await,
            Commands::Audit(command) => audit::run(&connect(&config).await?, command).await,
            Commands::Profile(command) => profile::run(&connect(&config).await?, command).await,
            Commands::Reminders(command) => {
                reminders::run(&connect(&config).await?, command).await
            }
        }
    }
}

async fn connect(config: &AppConfig) -> Result<AppContext, String> {
    AppContext::from_config(config, Arc::new(LoggingNotifier))
        .await
        .map_err(|error| output::failure("failed to initialise", &error))
}
