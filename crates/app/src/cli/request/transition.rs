use clap::Args;
use custody::ids::UserId;
use custody_app::{
    context::AppContext,
    domain::{requests::records::RequestId, transitions::TransitionsService},
};

use crate::cli::output::{failure, print_request};

#[derive(Debug, Args)]
pub(crate) struct TransitionArgs {
    /// Request id
    id: i64,

    /// Acting user id
    #[arg(long)]
    actor: i64,
}

#[derive(Debug, Args)]
pub(crate) struct DecideArgs {
    #[command(flatten)]
    target: TransitionArgs,

    /// Approve the request
    #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
    approve: bool,

    /// Reject the request and release its tokens
    #[arg(long)]
    reject: bool,
}

pub(crate) async fn decide(ctx: &AppContext, args: DecideArgs) -> Result<(), String> {
    let request = ctx
        .transitions
        .decide(
            RequestId::from(args.target.id),
            UserId::new(args.target.actor),
            args.approve,
        )
        .await
        .map_err(|error| failure("failed to decide request", &error))?;

    print_request(&request);

    Ok(())
}

pub(crate) async fn issue(ctx: &AppContext, args: TransitionArgs) -> Result<(), String> {
    let request = ctx
        .transitions
        .issue(RequestId::from(args.id), UserId::new(args.actor))
        .await
        .map_err(|error| failure("failed to issue request", &error))?;

    print_request(&request);

    Ok(())
}

pub(crate) async fn return_request(ctx: &AppContext, args: TransitionArgs) -> Result<(), String> {
    let request = ctx
        .transitions
        .return_request(RequestId::from(args.id), UserId::new(args.actor))
        .await
        .map_err(|error| failure("failed to return request", &error))?;

    print_request(&request);

    Ok(())
}
