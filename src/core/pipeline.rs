//! Build pipeline
//!
//! Packages are built one at a time in build order. Each package runs a
//! fixed sequence of shell actions in its source directory:
//!
//! 1. configure (template with placeholders substituted)
//! 2. every `*.patch` file of its patch directory, sorted by file name
//! 3. build (defaults to `make -j<jobs>`)
//! 4. install
//!
//! Every action must exit zero before the next starts. The first failure
//! stops the run; packages built before it keep their artifacts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::manifest::Substitutions;
use crate::core::package::Package;
use crate::error::{BuildError, BuildStep};
use crate::infra::process::{shell_quote, CommandRunner};

/// Build toggles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Run configure commands
    pub configure: bool,
    /// Apply patches, build and install
    pub build: bool,
    /// Parallel jobs for the default build command
    pub jobs: usize,
    /// Patch utility; the patch path is appended
    pub patch_command: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            configure: true,
            build: true,
            jobs: num_cpus::get(),
            patch_command: defaults::PATCH_COMMAND.to_string(),
        }
    }
}

/// One shell action of a package pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Step this action belongs to
    pub step: BuildStep,
    /// Command line passed to the shell
    pub command: String,
}

/// Sequential configure/patch/build/install runner
pub struct BuildPipeline<'a> {
    runner: &'a dyn CommandRunner,
    substitutions: Substitutions,
    options: BuildOptions,
    patch_root: PathBuf,
}

impl<'a> BuildPipeline<'a> {
    /// Create a pipeline
    ///
    /// Relative patch directories are resolved against `patch_root`.
    pub fn new(
        runner: &'a dyn CommandRunner,
        substitutions: Substitutions,
        options: BuildOptions,
        patch_root: PathBuf,
    ) -> Self {
        Self {
            runner,
            substitutions,
            options,
            patch_root,
        }
    }

    /// Environment passed to every action
    pub fn environment(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "CROSS_COMPILE".to_string(),
                self.substitutions.cross_compiler().to_string(),
            ),
            ("JOBS".to_string(), self.options.jobs.to_string()),
        ])
    }

    /// Actions for one package, in execution order
    pub fn plan(&self, package: &Package) -> Result<Vec<Action>, BuildError> {
        let mut actions = Vec::new();

        if self.options.configure {
            if let Some(ref configure) = package.configure {
                actions.push(Action {
                    step: BuildStep::Configure,
                    command: self.substitutions.apply(configure),
                });
            }
        }

        if !self.options.build {
            return Ok(actions);
        }

        if let Some(ref dir) = package.patches {
            let dir = if dir.is_absolute() {
                dir.clone()
            } else {
                self.patch_root.join(dir)
            };
            for patch in patch_files(&dir)? {
                actions.push(Action {
                    step: BuildStep::Patch,
                    command: format!(
                        "{} {}",
                        self.options.patch_command,
                        shell_quote(&patch.display().to_string())
                    ),
                });
            }
        }

        let build = package.build.as_ref().map_or_else(
            || format!("make -j{}", self.options.jobs),
            |b| self.substitutions.apply(b),
        );
        actions.push(Action {
            step: BuildStep::Build,
            command: build,
        });

        if let Some(ref install) = package.install {
            actions.push(Action {
                step: BuildStep::Install,
                command: self.substitutions.apply(install),
            });
        }

        Ok(actions)
    }

    /// Run one package's pipeline in its source directory
    pub fn build_package(&self, package: &Package) -> Result<(), BuildError> {
        let source = package
            .source()
            .filter(|p| p.is_dir())
            .ok_or_else(|| BuildError::SourceMissing {
                package: package.name.clone(),
                path: package.source().map(Path::to_path_buf).unwrap_or_default(),
            })?;

        let env = self.environment();

        for action in self.plan(package)? {
            tracing::info!("{} [{}]: {}", package.name, action.step, action.command);

            let exit = self
                .runner
                .run(source, &action.command, &env)
                .map_err(|e| BuildError::Spawn {
                    package: package.name.clone(),
                    step: action.step,
                    error: e.to_string(),
                })?;

            if !exit.success() {
                return Err(BuildError::StepFailed {
                    package: package.name.clone(),
                    step: action.step,
                    reason: format!("`{}` {}", action.command, exit.describe()),
                });
            }
        }

        Ok(())
    }

    /// Build every package in order, stopping at the first failure
    pub fn run<'p, I>(&self, order: I) -> Result<usize, BuildError>
    where
        I: IntoIterator<Item = &'p Package>,
    {
        let mut built = 0;
        for package in order {
            self.build_package(package)?;
            built += 1;
        }
        Ok(built)
    }
}

/// `*.patch` files in `dir`, sorted by file name
pub fn patch_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = std::fs::read_dir(dir).map_err(|e| BuildError::PatchDirectory {
        path: dir.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut patches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "patch"))
        .collect();
    patches.sort();
    Ok(patches)
}
