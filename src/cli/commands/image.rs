//! CLI implementation for `crossroot image` command

use std::path::Path;

use anyhow::{Context, Result};

use super::load_manifest;
use crate::cli::output::status;
use crate::core::image::ImageAssembler;
use crate::core::manifest::Manifest;
use crate::infra::dirs::Workspace;
use crate::infra::inspect::ReadelfInspector;
use crate::infra::process::ShellRunner;

/// Execute the image command
pub fn execute(workspace: &Workspace, manifest_path: &Path, quiet: bool) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    assemble(workspace, &manifest, quiet)
}

/// Assemble and package the image described by `manifest`
pub(crate) fn assemble(workspace: &Workspace, manifest: &Manifest, quiet: bool) -> Result<()> {
    let inspector = ReadelfInspector::for_cross_compiler(&manifest.cross_compiler);
    let runner = ShellRunner::new();

    let report = ImageAssembler::new(
        &manifest.image_settings,
        workspace,
        &manifest.cross_compiler,
        &inspector,
        &runner,
    )
    .assemble()
    .context("Failed to assemble image")?;

    if quiet {
        return Ok(());
    }

    println!(
        "{} Image tree: {} executable(s), {} librar(y/ies) in {}",
        status::SUCCESS,
        report.executables,
        report.libraries,
        report.root.display()
    );
    if report.skipped > 0 {
        println!(
            "{} {} file(s) could not be inspected (see log)",
            status::WARNING,
            report.skipped
        );
    }
    if let Some(ref stats) = report.strip {
        println!(
            "{} Stripped {} file(s), saved {} bytes",
            status::INFO,
            stats.files_stripped,
            stats.bytes_saved()
        );
    }
    if report.overlay_files > 0 {
        println!("  Overlaid {} configuration file(s)", report.overlay_files);
    }
    if let Some(ref output) = report.output {
        println!("{} Packaged image: {}", status::SUCCESS, output.display());
    }

    Ok(())
}
