//! Crossroot CLI - cross-build orchestrator
//!
//! Entry point for the crossroot command-line application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crossroot::cli::output::status;
use crossroot::cli::Cli;

/// Log level from the verbosity flags; `RUST_LOG` takes precedence
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = cli.run().await {
        eprintln!("{} Error: {e:#}", status::ERROR);
        std::process::exit(1);
    }
}
