use clap::{Args, Subcommand};
use custody::{ids::TokenId, status::TokenStatus};
use custody_app::{context::AppContext, domain::tokens::TokensService};

use super::output::{failure, print_token};

#[derive(Debug, Args)]
pub(crate) struct TokensCommand {
    #[command(subcommand)]
    command: TokensSubcommand,
}

#[derive(Debug, Subcommand)]
enum TokensSubcommand {
    /// List tokens, optionally only those in one status
    List(ListTokensArgs),

    /// Show a single token
    Show(ShowTokenArgs),
}

#[derive(Debug, Args)]
struct ListTokensArgs {
    /// available, reserved or issued
    #[arg(long)]
    status: Option<TokenStatus>,
}

#[derive(Debug, Args)]
struct ShowTokenArgs {
    /// Token id, e.g. KEY-01
    token_id: String,
}

pub(crate) async fn run(ctx: &AppContext, command: TokensCommand) -> Result<(), String> {
    match command.command {
        TokensSubcommand::List(args) => {
            let tokens = match args.status {
                Some(status) => ctx.tokens.list_by_status(status).await,
                None => ctx.tokens.list_tokens().await,
            }
            .map_err(|error| failure("failed to list tokens", &error))?;

            if tokens.is_empty() {
                println!("no tokens found");
            }

            tokens.iter().for_each(print_token);
        }
        TokensSubcommand::Show(args) => {
            let token = ctx
                .tokens
                .get_token(&TokenId::new(args.token_id))
                .await
                .map_err(|error| failure("failed to load token", &error))?;

            print_token(&token);
        }
    }

    Ok(())
}
