//! Debug symbol stripping
//!
//! Runs `<cross_compiler>strip --strip-debug` over every ELF file in the
//! image tree. Stripping is best-effort: a missing tool or a failing file
//! is logged and counted, never fatal.

use std::path::{Path, PathBuf};
use std::process::Command;

/// ELF magic bytes
const ELF_MAGIC: &[u8] = &[0x7f, b'E', b'L', b'F'];

/// Strip statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StripStats {
    /// Files stripped
    pub files_stripped: usize,
    /// Regular files that are not ELF
    pub files_skipped: usize,
    /// Files the tool failed on
    pub files_failed: usize,
    /// Total size before stripping
    pub original_size: u64,
    /// Total size after stripping
    pub stripped_size: u64,
}

impl StripStats {
    /// Bytes saved
    pub fn bytes_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.stripped_size)
    }
}

/// Locate `<cross_compiler>strip`
pub fn find_strip_tool(cross_compiler: &str) -> Option<PathBuf> {
    which::which(format!("{cross_compiler}strip")).ok()
}

/// Check if a file is an ELF binary
pub fn is_elf_binary(path: &Path) -> bool {
    use std::io::Read;

    if !path.is_file() {
        return false;
    }

    let mut magic = [0u8; 4];
    std::fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|()| magic == ELF_MAGIC)
        .unwrap_or(false)
}

/// Strip one file in place, returning (before, after) sizes
pub fn strip_file(tool: &Path, path: &Path) -> Result<(u64, u64), String> {
    let before = std::fs::metadata(path).map_err(|e| e.to_string())?.len();

    let output = Command::new(tool)
        .arg("--strip-debug")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run {}: {e}", tool.display()))?;

    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }

    let after = std::fs::metadata(path).map_err(|e| e.to_string())?.len();
    Ok((before, after))
}

/// Strip every ELF file under `root` with `tool`
pub fn strip_tree(root: &Path, tool: &Path) -> StripStats {
    let mut stats = StripStats::default();

    for entry in walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if !is_elf_binary(path) {
            stats.files_skipped += 1;
            continue;
        }

        match strip_file(tool, path) {
            Ok((before, after)) => {
                tracing::debug!("Stripped {} ({before} -> {after} bytes)", path.display());
                stats.files_stripped += 1;
                stats.original_size += before;
                stats.stripped_size += after;
            }
            Err(e) => {
                tracing::warn!("Failed to strip {}: {e}", path.display());
                stats.files_failed += 1;
            }
        }
    }

    stats
}

/// Strip the image tree if the cross toolchain provides `strip`
pub fn strip_image(root: &Path, cross_compiler: &str) -> StripStats {
    let Some(tool) = find_strip_tool(cross_compiler) else {
        tracing::warn!("{cross_compiler}strip not found, skipping debug symbol stripping");
        return StripStats::default();
    };

    tracing::info!("Stripping debug symbols in {}", root.display());
    let stats = strip_tree(root, &tool);
    tracing::info!(
        "Stripped {} file(s), saved {} bytes ({} failed)",
        stats.files_stripped,
        stats.bytes_saved(),
        stats.files_failed
    );
    stats
}
