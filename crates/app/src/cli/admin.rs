use clap::{Args, Subcommand};
use custody::ids::UserId;
use custody_app::{
    context::AppContext,
    domain::{
        requests::{LedgerService, records::RequestId},
        transitions::TransitionsService,
    },
};

use super::output::failure;

#[derive(Debug, Args)]
pub(crate) struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Debug, Subcommand)]
enum AdminSubcommand {
    /// Release a request's tokens and erase it, whatever its status
    Delete(DeleteArgs),

    /// Delete rejected and returned requests older than the retention period
    Purge(PurgeArgs),

    /// Print request and token counters
    Stats,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Request id
    id: i64,

    /// Administrator user id
    #[arg(long)]
    actor: i64,
}

#[derive(Debug, Args)]
struct PurgeArgs {
    /// Retention period in days
    #[arg(long, default_value_t = 365)]
    days: u32,
}

pub(crate) async fn run(ctx: &AppContext, command: AdminCommand) -> Result<(), String> {
    match command.command {
        AdminSubcommand::Delete(args) => {
            let deleted = ctx
                .transitions
                .admin_delete(RequestId::from(args.id), UserId::new(args.actor))
                .await
                .map_err(|error| failure("failed to delete request", &error))?;

            if deleted {
                println!("request {} deleted", args.id);
            } else {
                println!("request {} not found", args.id);
            }
        }
        AdminSubcommand::Purge(args) => {
            let purged = ctx
                .transitions
                .purge_older_than(args.days)
                .await
                .map_err(|error| failure("failed to purge requests", &error))?;

            println!("requests_purged: {purged}");
        }
        AdminSubcommand::Stats => {
            let stats = ctx
                .ledger
                .statistics()
                .await
                .map_err(|error| failure("failed to compute statistics", &error))?;

            println!("requests_total: {}", stats.total_requests());

            for (status, count) in &stats.requests_by_status {
                println!("requests_{}: {count}", status.as_str().to_ascii_lowercase());
            }

            for (status, count) in &stats.tokens_by_status {
                println!("tokens_{}: {count}", status.as_str().to_ascii_lowercase());
            }

            println!("distinct_requesters: {}", stats.distinct_requesters);
        }
    }

    Ok(())
}
