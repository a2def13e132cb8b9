//! Image assembly
//!
//! Builds the image tree from scratch: selected executables keep their
//! build-tree relative path, resolved libraries are flattened into the
//! library directory. Then the tree is optionally stripped, the
//! configuration overlay is copied on top, and the packaging tool runs once
//! over the result.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::closure::{self, LibraryClosure};
use crate::core::manifest::ImageSettings;
use crate::core::strip::{self, StripStats};
use crate::error::ImageError;
use crate::infra::dirs::Workspace;
use crate::infra::filesystem;
use crate::infra::inspect::LibraryInspector;
use crate::infra::process::{shell_quote, CommandRunner};

/// Summary of an assembled image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReport {
    /// Image tree root
    pub root: PathBuf,
    /// Packaged image, if a packager ran
    pub output: Option<PathBuf>,
    /// Executables copied
    pub executables: usize,
    /// Libraries copied
    pub libraries: usize,
    /// Files whose metadata could not be read
    pub skipped: usize,
    /// Overlay files copied
    pub overlay_files: usize,
    /// Strip results, when stripping was requested
    pub strip: Option<StripStats>,
}

/// Assembles and packages the image tree
pub struct ImageAssembler<'a> {
    settings: &'a ImageSettings,
    workspace: &'a Workspace,
    cross_compiler: String,
    inspector: &'a dyn LibraryInspector,
    runner: &'a dyn CommandRunner,
}

impl<'a> ImageAssembler<'a> {
    /// Create an assembler
    pub fn new(
        settings: &'a ImageSettings,
        workspace: &'a Workspace,
        cross_compiler: &str,
        inspector: &'a dyn LibraryInspector,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            settings,
            workspace,
            cross_compiler: cross_compiler.to_string(),
            inspector,
            runner,
        }
    }

    /// Root the executable patterns are matched against
    pub fn build_root(&self) -> PathBuf {
        self.settings.build_root.as_ref().map_or_else(
            || self.workspace.source_dir(),
            |p| self.workspace.resolve_path(p),
        )
    }

    /// Library search directories, resolved against the workspace
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.settings
            .search_dirs()
            .iter()
            .map(|p| self.workspace.resolve_path(p))
            .collect()
    }

    /// Resolve executables and their library closure
    pub fn resolve(&self) -> Result<LibraryClosure, ImageError> {
        let executables = closure::find_executables(&self.build_root(), &self.settings.executables)?;
        tracing::info!("Resolving libraries for {} executable(s)", executables.len());
        closure::resolve_closure(executables, &self.search_dirs(), self.inspector)
    }

    /// Build the image tree and package it
    pub fn assemble(&self) -> Result<ImageReport, ImageError> {
        let closure = self.resolve()?;
        let root = self.workspace.image_dir();

        filesystem::remove_dir_all(&root)?;
        filesystem::create_dir_all(&root)?;

        self.populate(&root, &closure)?;

        let strip = self
            .settings
            .strip
            .then(|| strip::strip_image(&root, &self.cross_compiler));

        let overlay_files = match self.settings.config_overlay {
            Some(ref overlay) => {
                let overlay = self.workspace.resolve_path(overlay);
                if !overlay.is_dir() {
                    return Err(ImageError::AssemblyFailure(format!(
                        "configuration overlay '{}' is not a directory",
                        overlay.display()
                    )));
                }
                filesystem::overlay_dir(&overlay, &root)?
            }
            None => 0,
        };

        let output = self.package(&root)?;

        Ok(ImageReport {
            root,
            output,
            executables: closure.executables.len(),
            libraries: closure.libraries.len(),
            skipped: closure.skipped.len(),
            overlay_files,
            strip,
        })
    }

    /// Copy executables and libraries into the image tree
    pub fn populate(&self, root: &Path, closure: &LibraryClosure) -> Result<(), ImageError> {
        for exe in &closure.executables {
            filesystem::copy_file(&exe.path, &root.join(&exe.relative))?;
        }

        let lib_dir = root.join(&self.settings.library_dir);
        filesystem::create_dir_all(&lib_dir)?;
        for (name, path) in &closure.libraries {
            filesystem::copy_file(path, &lib_dir.join(name))?;
        }

        tracing::info!(
            "Copied {} executable(s) and {} librar(y/ies) into {}",
            closure.executables.len(),
            closure.libraries.len(),
            root.display()
        );
        Ok(())
    }

    /// Run the packaging tool over `root`; an empty packager command skips packaging
    pub fn package(&self, root: &Path) -> Result<Option<PathBuf>, ImageError> {
        if self.settings.packager.trim().is_empty() {
            tracing::info!("No packager configured, leaving image tree unpackaged");
            return Ok(None);
        }

        let output_dir = self.workspace.output_dir();
        filesystem::create_dir_all(&output_dir)?;
        let output = output_dir.join(&self.settings.output);
        if output.exists() {
            std::fs::remove_file(&output).map_err(|e| {
                ImageError::AssemblyFailure(format!(
                    "cannot replace '{}': {e}",
                    output.display()
                ))
            })?;
        }

        let command = self
            .settings
            .packager
            .replace("{root}", &shell_quote(&root.display().to_string()))
            .replace("{output}", &shell_quote(&output.display().to_string()));

        tracing::info!("Packaging image: {command}");
        let exit = self
            .runner
            .run(self.workspace.root(), &command, &BTreeMap::new())
            .map_err(|e| ImageError::AssemblyFailure(format!("failed to run packager: {e}")))?;

        if !exit.success() {
            return Err(ImageError::AssemblyFailure(format!(
                "`{command}` {}",
                exit.describe()
            )));
        }

        Ok(Some(output))
    }
}
