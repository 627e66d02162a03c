use clap::{Args, Subcommand};
use custody_app::{config::AppConfig, database};

use super::output::failure;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Apply pending schema migrations
    Migrate,
}

pub(crate) async fn run(config: &AppConfig, command: DbCommand) -> Result<(), String> {
    match command.command {
        DbSubcommand::Migrate => migrate(config).await,
    }
}

async fn migrate(config: &AppConfig) -> Result<(), String> {
    let pool = database::connect(&config.database.database_url)
        .await
        .map_err(|error| failure("failed to connect to database", &error))?;

    database::migrate(&pool)
        .await
        .map_err(|error| failure("failed to apply migrations", &error))?;

    println!("migrations applied");

    Ok(())
}
