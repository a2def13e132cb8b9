//! Workspace directory layout
//!
//! Everything a run writes lives under one workspace root:
//! - `source/` - downloaded archives, extracted trees and the source index
//! - `cache/` - HTTP validation tokens
//! - `image/` - assembled image tree
//! - `output/` - packaged image
//!
//! The root defaults to the current directory. `CROSSROOT_WORK_DIR`
//! overrides it, and an explicit `--work-dir` overrides both.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults;

/// Resolved workspace paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Workspace rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the root from an explicit path, the environment, or the current directory
    ///
    /// Relative roots are made absolute so recorded source paths stay valid
    /// from any working directory.
    pub fn resolve(explicit: Option<PathBuf>) -> std::io::Result<Self> {
        let cwd = env::current_dir()?;
        let root = explicit
            .or_else(|| {
                env::var(defaults::WORK_DIR_ENV)
                    .ok()
                    .filter(|r| !r.is_empty())
                    .map(PathBuf::from)
            })
            .map_or_else(|| cwd.clone(), |root| cwd.join(root));
        Ok(Self::new(root))
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archives and extracted sources
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(defaults::SOURCE_DIR)
    }

    /// Validation token store
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(defaults::CACHE_DIR)
    }

    /// Persisted name -> source path index
    pub fn index_path(&self) -> PathBuf {
        self.source_dir().join(defaults::SOURCE_INDEX_FILE)
    }

    /// Assembled image tree
    pub fn image_dir(&self) -> PathBuf {
        self.root.join(defaults::IMAGE_DIR)
    }

    /// Packaged image output
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(defaults::OUTPUT_DIR)
    }

    /// Resolve a manifest-relative path against the workspace root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_under_root() {
        let ws = Workspace::new(PathBuf::from("/work"));
        assert_eq!(ws.source_dir(), PathBuf::from("/work/source"));
        assert_eq!(ws.cache_dir(), PathBuf::from("/work/cache"));
        assert_eq!(ws.index_path(), PathBuf::from("/work/source/valid_sources"));
        assert_eq!(ws.image_dir(), PathBuf::from("/work/image"));
        assert_eq!(ws.output_dir(), PathBuf::from("/work/output"));
    }

    #[test]
    fn test_explicit_root_wins() {
        let ws = Workspace::resolve(Some(PathBuf::from("/explicit"))).unwrap();
        assert_eq!(ws.root(), Path::new("/explicit"));
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let ws = Workspace::resolve(Some(PathBuf::from("work"))).unwrap();
        assert!(ws.root().is_absolute());
        assert!(ws.root().ends_with("work"));
    }

    #[test]
    fn test_resolve_path() {
        let ws = Workspace::new(PathBuf::from("/work"));
        assert_eq!(ws.resolve_path(Path::new("patches/zlib")), PathBuf::from("/work/patches/zlib"));
        assert_eq!(ws.resolve_path(Path::new("/opt/x")), PathBuf::from("/opt/x"));
    }
}
