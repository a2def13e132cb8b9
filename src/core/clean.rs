//! Clean logic
//!
//! Discards the persisted acquisition state: downloaded archives, extracted
//! sources and the source index (`source/`), and validation tokens
//! (`cache/`). With `all`, the assembled image tree and packaged output go
//! too.

use crate::config::defaults;
use crate::error::FilesystemError;
use crate::infra::dirs::Workspace;
use crate::infra::filesystem;

/// Directories removed by a plain clean
pub const CLEAN_DIRECTORIES: &[&str] = &[defaults::SOURCE_DIR, defaults::CACHE_DIR];

/// Extra directories removed by a full clean
pub const ARTIFACT_DIRECTORIES: &[&str] = &[defaults::IMAGE_DIR, defaults::OUTPUT_DIR];

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Directories that were removed
    pub removed: Vec<String>,
    /// Directories that didn't exist (skipped)
    pub skipped: Vec<String>,
}

/// Remove the workspace's cached state
pub fn clean_workspace(workspace: &Workspace, all: bool) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    let extra: &[&str] = if all { ARTIFACT_DIRECTORIES } else { &[] };
    for dir_name in CLEAN_DIRECTORIES.iter().chain(extra) {
        if filesystem::remove_dir_all(&workspace.root().join(dir_name))? {
            tracing::debug!("Removed {dir_name}/");
            result.removed.push((*dir_name).to_string());
        } else {
            result.skipped.push((*dir_name).to_string());
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Workspace) {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let ws = Workspace::new(temp.path().to_path_buf());
        (temp, ws)
    }

    #[test]
    fn test_clean_removes_source_and_cache() {
        let (_temp, ws) = workspace();
        std::fs::create_dir_all(ws.source_dir()).unwrap();
        std::fs::write(ws.index_path(), "{}").unwrap();
        std::fs::create_dir_all(ws.cache_dir()).unwrap();
        std::fs::create_dir_all(ws.image_dir()).unwrap();

        let result = clean_workspace(&ws, false).unwrap();

        assert!(!ws.source_dir().exists());
        assert!(!ws.cache_dir().exists());
        assert!(ws.image_dir().exists());
        assert_eq!(result.removed, vec!["source", "cache"]);
    }

    #[test]
    fn test_clean_all_removes_artifacts() {
        let (_temp, ws) = workspace();
        std::fs::create_dir_all(ws.image_dir()).unwrap();
        std::fs::create_dir_all(ws.output_dir()).unwrap();

        let result = clean_workspace(&ws, true).unwrap();

        assert!(!ws.image_dir().exists());
        assert!(!ws.output_dir().exists());
        assert_eq!(result.removed, vec!["image", "output"]);
        assert_eq!(result.skipped, vec!["source", "cache"]);
    }

    #[test]
    fn test_clean_succeeds_when_nothing_to_remove() {
        let (_temp, ws) = workspace();

        let result = clean_workspace(&ws, false).unwrap();

        assert!(result.removed.is_empty());
        assert_eq!(result.skipped.len(), 2);
    }
}
