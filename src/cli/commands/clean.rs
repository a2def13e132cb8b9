//! CLI implementation for `crossroot clean` command
//!
//! This module handles the CLI interface for discarding cached sources.

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::core::clean::clean_workspace;
use crate::infra::dirs::Workspace;

/// Execute the clean command
pub fn execute(workspace: &Workspace, all: bool) -> Result<()> {
    let result = clean_workspace(workspace, all).context("Failed to clean workspace")?;

    if result.removed.is_empty() {
        println!("{} Nothing to clean", status::SUCCESS);
    } else {
        println!("{} Cleaned workspace:", status::SUCCESS);
        for dir in &result.removed {
            println!("  Removed {dir}/");
        }
    }

    Ok(())
}
