//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod fetch;
pub mod image;
pub mod order;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::core::acquire::SourceAcquirer;
use crate::core::manifest::Manifest;
use crate::infra::dirs::Workspace;
use crate::infra::tags::{GithubTagClient, TagSource};

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch sources, build every package in dependency order and assemble the image
    Build {
        /// Manifest file (TOML, or JSON with a .json extension)
        manifest: PathBuf,

        /// Build only the specified package
        #[arg(short, long)]
        package: Option<String>,

        /// Parallel jobs for the default build command
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Maximum concurrent downloads/extractions (default: one per package)
        #[arg(long)]
        parallel: Option<usize>,

        /// Skip configure commands
        #[arg(long)]
        no_configure: bool,

        /// Skip patch, build and install commands
        #[arg(long)]
        no_build: bool,

        /// Skip image assembly
        #[arg(long)]
        no_image: bool,
    },

    /// Download and extract package sources
    Fetch {
        /// Manifest file
        manifest: PathBuf,

        /// Fetch only the specified package
        #[arg(short, long)]
        package: Option<String>,

        /// Maximum concurrent downloads/extractions (default: one per package)
        #[arg(long)]
        parallel: Option<usize>,
    },

    /// Print the build order with package priorities
    Order {
        /// Manifest file
        manifest: PathBuf,
    },

    /// Resolve library dependencies and assemble the image from an existing build
    Image {
        /// Manifest file
        manifest: PathBuf,
    },

    /// Remove downloaded sources and cached validation tokens
    Clean {
        /// Also remove the image tree and packaged output
        #[arg(long)]
        all: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, workspace: &Workspace, quiet: bool) -> Result<()> {
        match self {
            Self::Build {
                manifest,
                package,
                jobs,
                parallel,
                no_configure,
                no_build,
                no_image,
            } => {
                let args = build::BuildArgs {
                    package,
                    jobs,
                    parallel,
                    configure: !no_configure,
                    build: !no_build,
                    image: !no_image,
                };
                build::execute(workspace, &manifest, &args, quiet).await
            }
            Self::Fetch {
                manifest,
                package,
                parallel,
            } => fetch::execute(workspace, &manifest, package.as_deref(), parallel, quiet).await,
            Self::Order { manifest } => order::execute(&manifest),
            Self::Image { manifest } => image::execute(workspace, &manifest, quiet),
            Self::Clean { all } => clean::execute(workspace, all),
        }
    }
}

/// Load and validate a manifest
pub(crate) fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("Failed to load manifest {}", path.display()))
}

/// Tag lookup client, if a token is configured
pub(crate) fn tag_source(manifest: &Manifest) -> Result<Option<Arc<dyn TagSource>>> {
    let token = manifest.token().context("Failed to resolve oauth token")?;
    Ok(token.map(|token| {
        Arc::new(GithubTagClient::with_endpoint(
            &manifest.services.tag_endpoint,
            &token,
        )) as Arc<dyn TagSource>
    }))
}

/// Acquirer configured from the manifest's service settings
pub(crate) fn acquirer(
    workspace: &Workspace,
    manifest: &Manifest,
    parallel: Option<usize>,
) -> Result<SourceAcquirer> {
    Ok(SourceAcquirer::new(workspace.clone(), tag_source(manifest)?)
        .with_archive_host(&manifest.services.archive_host)
        .with_parallel(parallel))
}

/// Fail early when `--package` names something the manifest lacks
pub(crate) fn ensure_package(manifest: &Manifest, package: Option<&str>) -> Result<()> {
    if let Some(name) = package {
        if manifest.package(name).is_none() {
            anyhow::bail!("Package '{name}' is not declared in the manifest");
        }
    }
    Ok(())
}
