use clap::{Args, Subcommand};
use custody_app::{
    context::AppContext,
    domain::requests::{LedgerService, records::RequestId},
};

use super::output::{failure, print_request_line};

#[derive(Debug, Args)]
pub(crate) struct RemindersCommand {
    #[command(subcommand)]
    command: RemindersSubcommand,
}

#[derive(Debug, Subcommand)]
enum RemindersSubcommand {
    /// List undecided requests that are due a reminder
    Due(DueArgs),

    /// Record that reminders were sent
    Mark(MarkArgs),
}

#[derive(Debug, Args)]
struct DueArgs {
    /// Minutes a request waits before the first reminder
    #[arg(long, default_value_t = 60)]
    after_minutes: u32,

    /// Minutes between repeated reminders
    #[arg(long, default_value_t = 240)]
    repeat_minutes: u32,
}

#[derive(Debug, Args)]
struct MarkArgs {
    /// Request ids that were reminded
    #[arg(required = true)]
    ids: Vec<i64>,
}

pub(crate) async fn run(ctx: &AppContext, command: RemindersCommand) -> Result<(), String> {
    match command.command {
        RemindersSubcommand::Due(args) => {
            let due = ctx
                .ledger
                .pending_for_remind(args.after_minutes, args.repeat_minutes)
                .await
                .map_err(|error| failure("failed to list due reminders", &error))?;

            due.iter().for_each(print_request_line);
        }
        RemindersSubcommand::Mark(args) => {
            let ids: Vec<RequestId> = args.ids.into_iter().map(RequestId::from).collect();

            let marked = ctx
                .ledger
                .mark_reminded(&ids)
                .await
                .map_err(|error| failure("failed to mark reminders", &error))?;

            println!("requests_marked: {marked}");
        }
    }

    Ok(())
}
