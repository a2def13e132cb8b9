//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::defaults;
use crate::infra::dirs::Workspace;
use commands::Commands;

/// Crossroot - cross-build orchestrator
///
/// Fetches the latest tagged sources of interdependent packages, builds them
/// in dependency order and assembles a minimal runtime image.
#[derive(Parser, Debug)]
#[command(name = "crossroot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Workspace root holding source/, cache/, image/ and output/
    #[arg(long, global = true, env = defaults::WORK_DIR_ENV)]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        if let Some(cmd) = self.command {
            let workspace =
                Workspace::resolve(self.work_dir).context("Failed to resolve workspace root")?;
            tracing::debug!("Workspace: {}", workspace.root().display());
            cmd.run(&workspace, self.quiet).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
