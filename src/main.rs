use std::process::ExitCode;

use clap::Parser;
use log::debug;

mod cli;
use crate::cli::Cli;
use crate::cli::Commands;

mod dump;
mod error;
mod extract;
mod pack;

fn main() -> ExitCode {
    // Parse the cli
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let endpoint = cli.endpoint.as_deref();
    let res = match &cli.command {
        Commands::Dump { locators } => dump::run(&mut std::io::stdout(), locators, endpoint),
        Commands::Extract {
            locator,
            index,
            output,
        } => extract::run(locator, *index, output, endpoint),
        Commands::Pack { manifest, output } => pack::run(manifest, output),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
