mod cli;
mod commands;
mod config;
mod edit;
mod error;
mod git;
mod github;
mod output;
mod pipeline;
mod prompt;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use cli::Cli;
use config::{Config, Overrides};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "orgsweep=debug" } else { "orgsweep=info" };
    let filter = EnvFilter::try_from_env("ORGSWEEP_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// git2::Repository is !Send, so everything stays on one thread
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let overrides = Overrides {
        org: cli.global.org.clone(),
        root_dir: cli.global.root_dir.clone(),
        output_dir: cli.global.output_dir.clone(),
    };
    let result = match Config::load(overrides) {
        Ok(config) => {
            tracing::debug!(?config, "configuration loaded");
            commands::execute(cli.command, config, &cli.global).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
