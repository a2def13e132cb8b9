//! Filesystem operations
//!
//! Handles file and directory operations.

use std::path::Path;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
///
/// Returns whether anything was removed.
pub fn remove_dir_all(path: &Path) -> Result<bool, FilesystemError> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(true)
}

/// Write content to a file
pub fn write_file(path: &Path, content: &[u8]) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write content to a file via a sibling temporary file and rename
///
/// Readers see either the old content or the new content, never a prefix.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), FilesystemError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    write_file(&tmp, content)?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        FilesystemError::WriteFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }
    })
}

/// Copy a file, creating the destination's parent directories
///
/// Permissions are carried over.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64, FilesystemError> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    std::fs::copy(from, to).map_err(|e| FilesystemError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    })
}

/// Copy a directory tree over `dest`, overwriting files that exist in both
///
/// Returns the number of files copied.
pub fn overlay_dir(src: &Path, dest: &Path) -> Result<usize, FilesystemError> {
    let mut copied = 0;

    for entry in walkdir::WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| FilesystemError::ReadFile {
            path: src.to_path_buf(),
            error: e.to_string(),
        })?;

        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}
