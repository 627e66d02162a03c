use clap::Args;
use custody::ids::UserId;
use custody_app::{
    context::AppContext,
    domain::{
        profiles::ProfilesService, requests::data::NewRequest, transitions::TransitionsService,
    },
};

use crate::cli::output::failure;

#[derive(Debug, Args)]
pub(crate) struct CreateRequestArgs {
    /// Requesting user id
    #[arg(long)]
    requester: i64,

    /// Display name recorded on the request; defaults to the requester's profile name
    #[arg(long)]
    name: Option<String>,

    /// Company whose token is needed; repeat for several
    #[arg(long = "company", required = true)]
    companies: Vec<String>,

    /// Why the tokens are needed
    #[arg(long)]
    purpose: String,

    /// Optional note for the approver
    #[arg(long)]
    comment: Option<String>,
}

pub(crate) async fn run(ctx: &AppContext, args: CreateRequestArgs) -> Result<(), String> {
    let requester = UserId::new(args.requester);

    let items = ctx
        .catalog
        .resolve(&args.companies)
        .map_err(|error| failure("failed to resolve companies", &error))?;

    let requester_display_name = match args.name {
        Some(name) => Some(name),
        None => ctx
            .profiles
            .get_display_name(requester)
            .await
            .map_err(|error| failure("failed to load profile", &error))?,
    };

    let id = ctx
        .transitions
        .create_request(NewRequest {
            requester_id: requester,
            requester_display_name,
            items,
            purpose: args.purpose,
            comment: args.comment,
        })
        .await
        .map_err(|error| failure("failed to create request", &error))?;

    println!("request_id: {id}");

    Ok(())
}
