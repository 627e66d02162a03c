use clap::{Args, Subcommand};
use custody_app::context::AppContext;

mod create;
mod list;
mod show;
mod transition;

#[derive(Debug, Args)]
pub(crate) struct RequestCommand {
    #[command(subcommand)]
    command: RequestSubcommand,
}

#[derive(Debug, Subcommand)]
enum RequestSubcommand {
    /// Ask for one or more tokens
    Create(create::CreateRequestArgs),

    /// Approve or reject a pending request
    Decide(transition::DecideArgs),

    /// Hand the tokens of an approved request over
    Issue(transition::TransitionArgs),

    /// Take the tokens of an issued request back
    Return(transition::TransitionArgs),

    /// Show a request and its items
    Show(show::ShowRequestArgs),

    /// List recent requests
    List(list::ListRequestsArgs),
}

pub(crate) async fn run(ctx: &AppContext, command: RequestCommand) -> Result<(), String> {
    match command.command {
        RequestSubcommand::Create(args) => create::run(ctx, args).await,
        RequestSubcommand::Decide(args) => transition::decide(ctx, args).await,
        RequestSubcommand::Issue(args) => transition::issue(ctx, args).await,
        RequestSubcommand::Return(args) => transition::return_request(ctx, args).await,
        RequestSubcommand::Show(args) => show::run(ctx, args).await,
        RequestSubcommand::List(args) => list::run(ctx, args).await,
    }
}
