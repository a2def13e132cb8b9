//! Source archive extraction
//!
//! Unpacks gzip-compressed tarballs entry by entry. Only directory and
//! regular-file entries are materialized; everything else (pax headers,
//! links, devices) is skipped. The first directory entry is taken as the
//! archive's top-level directory, which holds for archives exported by
//! GitHub and `git archive`.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;

use crate::error::ExtractError;

/// Return the extracted source directory for `path`
///
/// A directory is returned unchanged; anything else is treated as a
/// `.tar.gz` archive and unpacked under `dest_root`.
pub fn extract(path: &Path, dest_root: &Path) -> Result<PathBuf, ExtractError> {
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }
    extract_tar_gz(path, dest_root)
}

/// Unpack a `.tar.gz` archive under `dest_root`, returning its top-level directory
pub fn extract_tar_gz(archive: &Path, dest_root: &Path) -> Result<PathBuf, ExtractError> {
    let fail = |error: String| ExtractError::ExtractionFailure {
        archive: archive.to_path_buf(),
        error,
    };

    let file = File::open(archive).map_err(|e| fail(e.to_string()))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut top_level: Option<PathBuf> = None;

    for entry in tarball.entries().map_err(|e| fail(e.to_string()))? {
        let mut entry = entry.map_err(|e| fail(e.to_string()))?;
        let relative = entry.path().map_err(|e| fail(e.to_string()))?.into_owned();

        if !is_contained(&relative) {
            return Err(fail(format!(
                "entry '{}' escapes the extraction root",
                relative.display()
            )));
        }

        let target = dest_root.join(&relative);
        let mode = entry.header().mode().unwrap_or(0o644);

        match entry.header().entry_type() {
            EntryType::Directory => {
                if top_level.is_none() {
                    top_level = Some(target.clone());
                }
                if target.is_dir() {
                    continue;
                }
                fs::create_dir_all(&target).map_err(|e| fail(e.to_string()))?;
                set_mode(&target, mode).map_err(|e| fail(e.to_string()))?;
            }
            EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
                }
                let mut out = File::create(&target).map_err(|e| fail(e.to_string()))?;
                io::copy(&mut entry, &mut out).map_err(|e| fail(e.to_string()))?;
                set_mode(&target, mode).map_err(|e| fail(e.to_string()))?;
            }
            other => {
                tracing::trace!("Skipping {:?} entry {}", other, relative.display());
            }
        }
    }

    top_level.ok_or_else(|| ExtractError::NoTopLevelDirectory {
        archive: archive.to_path_buf(),
    })
}

/// Reject absolute paths and `..` components
fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
