//! Error types for crossroot
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Manifest loading errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file could not be read
    #[error("Failed to read manifest '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Manifest file could not be parsed
    #[error("Failed to parse manifest '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Two packages share a name
    #[error("Package '{name}' is declared more than once")]
    DuplicatePackage { name: String },

    /// Package without a name
    #[error("Package #{index} has no name")]
    UnnamedPackage { index: usize },

    /// Environment substitution failed
    #[error("Failed to substitute environment variables: {0}")]
    Substitution(String),
}

/// Build-order scheduling errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Dependency graph contains a cycle
    #[error("Cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A package depends on something that is not in the manifest
    #[error("Missing dependency: '{dependency}' required by '{package}'")]
    MissingDependency { package: String, dependency: String },
}

/// Source acquisition errors
#[derive(Error, Debug)]
pub enum AcquireError {
    /// Repository URI is not `https://host/owner/name`
    #[error("Repository '{repository}' is not in the required https://github.com/owner/repo format")]
    InvalidRepositoryFormat { repository: String },

    /// Tag lookup returned zero or several candidates, or failed outright
    #[error("Unable to resolve latest tag for '{owner}/{name}': {reason}")]
    TagResolutionFailure {
        owner: String,
        name: String,
        reason: String,
    },

    /// Transport failure while downloading
    #[error("Failed to download '{url}': {error}")]
    DownloadFailure { url: String, error: String },

    /// No credentials for the tag lookup service
    #[error("No oauth token specified (set oauth_token in the manifest or GITHUB_TOKEN)")]
    MissingToken,

    /// Source index could not be read or written
    #[error("Source index '{path}': {error}")]
    Index { path: PathBuf, error: String },

    /// Extraction failed after download
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Worker task panicked or was cancelled
    #[error("Acquisition task for '{package}' failed: {error}")]
    Task { package: String, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Archive could not be opened, decompressed or unpacked
    #[error("Failed to extract '{archive}': {error}")]
    ExtractionFailure { archive: PathBuf, error: String },

    /// Archive contained no directory entry
    #[error("Archive '{archive}' has no top-level directory")]
    NoTopLevelDirectory { archive: PathBuf },
}

/// Build step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// Configure command
    Configure,
    /// Patch application
    Patch,
    /// Build command
    Build,
    /// Install command
    Install,
}

impl std::fmt::Display for BuildStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configure => "configure",
            Self::Patch => "patch",
            Self::Build => "build",
            Self::Install => "install",
        };
        f.write_str(name)
    }
}

/// Build pipeline errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// A shell action exited non-zero
    #[error("Build step '{step}' failed for package '{package}': {reason}")]
    StepFailed {
        package: String,
        step: BuildStep,
        reason: String,
    },

    /// The shell could not be started
    #[error("Failed to run {step} for package '{package}': {error}")]
    Spawn {
        package: String,
        step: BuildStep,
        error: String,
    },

    /// Package has no populated source directory
    #[error("Package '{package}' has no source directory (expected '{}')", path.display())]
    SourceMissing { package: String, path: PathBuf },

    /// Patch directory could not be listed
    #[error("Failed to read patch directory '{path}': {error}")]
    PatchDirectory { path: PathBuf, error: String },
}

/// Image assembly errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// A required shared library is in none of the search directories
    #[error("Library '{library}' (needed by '{}') not found in any search path", needed_by.display())]
    LibraryNotFound { library: String, needed_by: PathBuf },

    /// Binary metadata could not be read
    #[error("Failed to read binary metadata of '{path}': {error}")]
    MetadataToolFailure { path: PathBuf, error: String },

    /// Invalid executable pattern
    #[error("Invalid executable pattern '{pattern}': {error}")]
    Pattern { pattern: String, error: String },

    /// Copying into the image tree or packaging failed
    #[error("Image assembly failed: {0}")]
    AssemblyFailure(String),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Top-level crossroot error type
#[derive(Error, Debug)]
pub enum CrossrootError {
    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Scheduler error
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Acquisition error
    #[error("Acquisition error: {0}")]
    Acquire(#[from] AcquireError),

    /// Extraction error
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Image error
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}

impl From<crate::infra::pool::TaskFailure> for AcquireError {
    fn from(failure: crate::infra::pool::TaskFailure) -> Self {
        Self::Task {
            package: failure.key,
            error: failure.error,
        }
    }
}
