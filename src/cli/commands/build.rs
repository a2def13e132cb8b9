//! CLI implementation for `crossroot build` command
//!
//! Full run: the build order is computed first, so a broken dependency
//! graph fails before any network access. Sources are then acquired
//! concurrently, packages are built one by one, and the image is assembled
//! at the end.

use std::path::Path;

use anyhow::{Context, Result};

use super::{acquirer, ensure_package, load_manifest};
use crate::cli::output::{create_spinner, print_acquire_report, status};
use crate::core::pipeline::{BuildOptions, BuildPipeline};
use crate::core::scheduler::build_order;
use crate::infra::dirs::Workspace;
use crate::infra::process::ShellRunner;

/// Options for a build run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    /// Only acquire and build this package
    pub package: Option<String>,
    /// Parallel jobs for the default build command
    pub jobs: Option<usize>,
    /// Bound on concurrent acquisition tasks
    pub parallel: Option<usize>,
    /// Run configure commands
    pub configure: bool,
    /// Run patch/build/install commands
    pub build: bool,
    /// Assemble the image afterwards
    pub image: bool,
}

/// Execute the build command
pub async fn execute(
    workspace: &Workspace,
    manifest_path: &Path,
    args: &BuildArgs,
    quiet: bool,
) -> Result<()> {
    let mut manifest = load_manifest(manifest_path)?;
    ensure_package(&manifest, args.package.as_deref())?;

    let order: Vec<String> = build_order(&manifest.packages)
        .context("Failed to compute build order")?
        .into_iter()
        .map(|p| p.name.clone())
        .collect();
    tracing::info!("Build order: {}", order.join(" -> "));

    let spinner = create_spinner("Fetching sources...", quiet);
    let fetched = acquirer(workspace, &manifest, args.parallel)?
        .acquire(&mut manifest.packages, args.package.as_deref())
        .await;
    spinner.finish_and_clear();
    let report = fetched.context("Failed to fetch sources")?;
    if !quiet {
        print_acquire_report(&report);
    }

    let options = BuildOptions {
        configure: args.configure,
        build: args.build,
        jobs: args.jobs.unwrap_or_else(num_cpus::get).max(1),
        ..BuildOptions::default()
    };
    let runner = ShellRunner::new();
    let pipeline = BuildPipeline::new(
        &runner,
        manifest.substitutions(),
        options,
        workspace.root().to_path_buf(),
    );

    let selected: Vec<&str> = order
        .iter()
        .map(String::as_str)
        .filter(|name| args.package.as_deref().map_or(true, |only| only == *name))
        .collect();

    for (i, name) in selected.iter().enumerate() {
        let Some(package) = manifest.package(name) else {
            continue;
        };
        if !quiet {
            println!("\n[{}/{}] {name}", i + 1, selected.len());
        }
        pipeline
            .build_package(package)
            .with_context(|| format!("Failed to build {name}"))?;
    }

    if !quiet {
        println!("\n{} Built {} package(s)", status::SUCCESS, selected.len());
    }

    if !args.image {
        return Ok(());
    }
    if args.package.is_some() {
        tracing::info!("Single-package build, skipping image assembly");
        return Ok(());
    }
    if manifest.image_settings.executables.is_empty() {
        tracing::info!("No executables selected, skipping image assembly");
        return Ok(());
    }

    super::image::assemble(workspace, &manifest, quiet)
}
