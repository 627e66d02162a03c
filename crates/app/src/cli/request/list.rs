use clap::Args;
use custody::{ids::UserId, status::RequestStatus};
use custody_app::{context::AppContext, domain::requests::LedgerService};

use crate::cli::output::{failure, print_request_line};

#[derive(Debug, Args)]
pub(crate) struct ListRequestsArgs {
    /// Only requests in this status
    #[arg(long, conflicts_with = "requester")]
    status: Option<RequestStatus>,

    /// Only requests submitted by this user id
    #[arg(long)]
    requester: Option<i64>,

    /// Maximum number of requests to print
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

pub(crate) async fn run(ctx: &AppContext, args: ListRequestsArgs) -> Result<(), String> {
    let requests = match (args.status, args.requester) {
        (Some(status), _) => ctx.ledger.list_by_status(status, args.limit).await,
        (None, Some(requester)) => {
            ctx.ledger
                .list_by_requester(UserId::new(requester), args.limit)
                .await
        }
        (None, None) => ctx.ledger.list_recent(args.limit).await,
    }
    .map_err(|error| failure("failed to list requests", &error))?;

    if requests.is_empty() {
        println!("no requests found");
    }

    requests.iter().for_each(print_request_line);

    Ok(())
}
