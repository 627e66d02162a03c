use clap::{Args, Subcommand};
use custody::ids::{TokenId, UserId};
use custody_app::{context::AppContext, domain::waitlist::WaitlistService};

use super::output::{failure, print_waitlist_entry};

#[derive(Debug, Args)]
pub(crate) struct WaitlistCommand {
    #[command(subcommand)]
    command: WaitlistSubcommand,
}

#[derive(Debug, Subcommand)]
enum WaitlistSubcommand {
    /// Wait for a company's token to become available
    Join(JoinArgs),

    /// Show what a requester is waiting on
    List(ListArgs),

    /// Remove and print the waiters on tokens that are available now
    Pop(PopArgs),
}

#[derive(Debug, Args)]
struct JoinArgs {
    /// Waiting user id
    #[arg(long)]
    requester: i64,

    /// Company whose token is wanted
    #[arg(long)]
    company: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Waiting user id
    #[arg(long)]
    requester: i64,
}

#[derive(Debug, Args)]
struct PopArgs {
    /// Token id to check; repeat for several
    #[arg(long = "token", required = true)]
    tokens: Vec<String>,
}

pub(crate) async fn run(ctx: &AppContext, command: WaitlistCommand) -> Result<(), String> {
    match command.command {
        WaitlistSubcommand::Join(args) => {
            let token = ctx
                .catalog
                .token_for(&args.company)
                .ok_or_else(|| format!("company {:?} is not in the catalog", args.company))?;

            let joined = ctx
                .waitlist
                .join(UserId::new(args.requester), token, &args.company)
                .await
                .map_err(|error| failure("failed to join waitlist", &error))?;

            if joined {
                println!("waiting for {token} ({})", args.company);
            } else {
                println!("already waiting for {token} ({})", args.company);
            }
        }
        WaitlistSubcommand::List(args) => {
            let entries = ctx
                .waitlist
                .list_for_user(UserId::new(args.requester))
                .await
                .map_err(|error| failure("failed to list waitlist", &error))?;

            if entries.is_empty() {
                println!("not waiting for any token");
            }

            entries.iter().for_each(print_waitlist_entry);
        }
        WaitlistSubcommand::Pop(args) => {
            let tokens: Vec<TokenId> = args.tokens.into_iter().map(TokenId::new).collect();

            let entries = ctx
                .waitlist
                .pop_available(&tokens)
                .await
                .map_err(|error| failure("failed to pop waitlist", &error))?;

            entries.iter().for_each(print_waitlist_entry);
        }
    }

    Ok(())
}
