use clap::Args;
use custody_app::{
    context::AppContext,
    domain::requests::{LedgerService, records::RequestId},
};

use crate::cli::output::{failure, print_items, print_request};

#[derive(Debug, Args)]
pub(crate) struct ShowRequestArgs {
    /// Request id
    id: i64,
}

pub(crate) async fn run(ctx: &AppContext, args: ShowRequestArgs) -> Result<(), String> {
    let id = RequestId::from(args.id);

    let request = ctx
        .ledger
        .get_request(id)
        .await
        .map_err(|error| failure("failed to load request", &error))?;

    let items = ctx
        .ledger
        .get_request_items(id)
        .await
        .map_err(|error| failure("failed to load request items", &error))?;

    print_request(&request);
    print_items(&items);

    Ok(())
}
