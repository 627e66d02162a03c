use clap::{Args, Subcommand};
use custody_app::{
    context::AppContext,
    domain::{audit::AuditService, requests::records::RequestId},
};

use super::output::{failure, print_audit_entry};

#[derive(Debug, Args)]
pub(crate) struct AuditCommand {
    #[command(subcommand)]
    command: AuditSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuditSubcommand {
    /// Print audit entries, most recent first
    List(ListAuditArgs),
}

#[derive(Debug, Args)]
struct ListAuditArgs {
    /// Only entries for this request id
    #[arg(long)]
    request: Option<i64>,

    /// Maximum number of entries to print
    #[arg(long, default_value_t = 50)]
    limit: u32,
}

pub(crate) async fn run(ctx: &AppContext, command: AuditCommand) -> Result<(), String> {
    match command.command {
        AuditSubcommand::List(args) => {
            let entries = ctx
                .audit
                .query(args.request.map(RequestId::from), args.limit)
                .await
                .map_err(|error| failure("failed to query audit log", &error))?;

            entries.iter().for_each(print_audit_entry);
        }
    }

    Ok(())
}
