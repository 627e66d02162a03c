//! Custody Application CLI

use std::process;

use clap::Parser;
use custody_app::config::load_dotenv;

mod cli;
mod observability;

use cli::Cli;

#[tokio::main]
pub async fn main() {
    load_dotenv();

    let cli = Cli::parse();

    if let Err(error) = observability::init_logging(&cli.config.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
