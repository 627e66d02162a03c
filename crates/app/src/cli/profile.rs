use clap::{Args, Subcommand};
use custody::ids::UserId;
use custody_app::{context::AppContext, domain::profiles::ProfilesService};

use super::output::failure;

#[derive(Debug, Args)]
pub(crate) struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProfileSubcommand {
    /// Store a display name and back-fill it on unnamed requests
    Set(SetArgs),

    /// Print the stored display name
    Get(GetArgs),
}

#[derive(Debug, Args)]
struct SetArgs {
    /// User id
    #[arg(long)]
    user: i64,

    /// Display name
    name: String,
}

#[derive(Debug, Args)]
struct GetArgs {
    /// User id
    #[arg(long)]
    user: i64,
}

pub(crate) async fn run(ctx: &AppContext, command: ProfileCommand) -> Result<(), String> {
    match command.command {
        ProfileSubcommand::Set(args) => {
            let backfilled = ctx
                .profiles
                .set_display_name(UserId::new(args.user), &args.name)
                .await
                .map_err(|error| failure("failed to set display name", &error))?;

            println!("requests_backfilled: {backfilled}");
        }
        ProfileSubcommand::Get(args) => {
            let name = ctx
                .profiles
                .get_display_name(UserId::new(args.user))
                .await
                .map_err(|error| failure("failed to load display name", &error))?;

            match name {
                Some(name) => println!("display_name: {name}"),
                None => println!("no display name set for user {}", args.user),
            }
        }
    }

    Ok(())
}
