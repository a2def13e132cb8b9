//! CLI implementation for `crossroot fetch` command
//!
//! This module handles the CLI interface for downloading package sources.

use std::path::Path;

use anyhow::{Context, Result};

use super::{acquirer, ensure_package, load_manifest};
use crate::cli::output::{create_spinner, print_acquire_report, status};
use crate::infra::dirs::Workspace;

/// Execute the fetch command
pub async fn execute(
    workspace: &Workspace,
    manifest_path: &Path,
    package: Option<&str>,
    parallel: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let mut manifest = load_manifest(manifest_path)?;
    ensure_package(&manifest, package)?;

    let spinner = create_spinner("Fetching sources...", quiet);
    let result = acquirer(workspace, &manifest, parallel)?
        .acquire(&mut manifest.packages, package)
        .await;
    spinner.finish_and_clear();

    let report = result.context("Failed to fetch sources")?;

    if !quiet {
        print_acquire_report(&report);
        println!(
            "{} Sources ready in {}",
            status::SUCCESS,
            workspace.source_dir().display()
        );
    }

    Ok(())
}
