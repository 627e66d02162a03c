use clap::{Args, Subcommand};
use custody_app::{context::AppContext, domain::tokens::TokensService};

use super::output::failure;

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// Insert catalog tokens missing from the ledger as available
    Seed,

    /// Print the company to token mapping
    Show,
}

pub(crate) async fn run(ctx: &AppContext, command: CatalogCommand) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::Seed => {
            let inserted = ctx
                .tokens
                .seed_catalog(&ctx.catalog)
                .await
                .map_err(|error| failure("failed to seed tokens", &error))?;

            println!("tokens_added: {inserted}");
        }
        CatalogSubcommand::Show => {
            for entry in ctx.catalog.entries() {
                println!("{}\t{}\t{}", entry.token_id, entry.company, entry.description());
            }
        }
    }

    Ok(())
}
