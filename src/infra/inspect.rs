//! Binary metadata inspection
//!
//! The closure resolver only needs one capability from a binary: the names
//! of the shared libraries it requires at load time. [`LibraryInspector`]
//! is that capability; [`ReadelfInspector`] implements it by running the
//! cross toolchain's `readelf -d` and reading the `(NEEDED)` entries.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use crate::error::ImageError;

/// "Given a binary path, return its required library names"
pub trait LibraryInspector {
    /// Directly required library names, in the order the binary lists them
    fn needed_libraries(&self, binary: &Path) -> Result<Vec<String>, ImageError>;
}

/// `readelf`-based inspector
#[derive(Debug, Clone)]
pub struct ReadelfInspector {
    tool: PathBuf,
}

impl ReadelfInspector {
    /// Locate `<cross_compiler>readelf`, falling back to the host `readelf`
    pub fn for_cross_compiler(cross_compiler: &str) -> Self {
        let cross = format!("{cross_compiler}readelf");
        let tool = which::which(&cross)
            .or_else(|_| which::which("readelf"))
            .unwrap_or_else(|_| PathBuf::from(cross));
        tracing::debug!("Using {} for library inspection", tool.display());
        Self::with_tool(tool)
    }

    /// Use an explicit tool path
    pub fn with_tool(tool: PathBuf) -> Self {
        Self { tool }
    }
}

impl LibraryInspector for ReadelfInspector {
    fn needed_libraries(&self, binary: &Path) -> Result<Vec<String>, ImageError> {
        let failure = |error: String| ImageError::MetadataToolFailure {
            path: binary.to_path_buf(),
            error,
        };

        let output = Command::new(&self.tool)
            .arg("-d")
            .arg(binary)
            .output()
            .map_err(|e| failure(format!("failed to run {}: {e}", self.tool.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(stderr.trim().to_string()));
        }

        Ok(parse_needed(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract library names from `(NEEDED) Shared library: [name]` lines
pub fn parse_needed(dynamic_section: &str) -> Vec<String> {
    static NEEDED: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = NEEDED
        .get_or_init(|| Regex::new(r"\(NEEDED\)\s+Shared library:\s*\[([^\]]+)\]").ok())
    else {
        return Vec::new();
    };

    re.captures_iter(dynamic_section)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUSYBOX_DYNAMIC: &str = "\
Dynamic section at offset 0x10f0c contains 25 entries:
  Tag        Type                         Name/Value
 0x00000001 (NEEDED)                     Shared library: [libm.so.6]
 0x00000001 (NEEDED)                     Shared library: [libc.so.6]
 0x0000000c (INIT)                       0x10470
 0x0000000e (SONAME)                     Library soname: [libbusy.so]
 0x6ffffffe (VERNEED)                    0x103f8
";

    #[test]
    fn test_parse_needed() {
        assert_eq!(parse_needed(BUSYBOX_DYNAMIC), vec!["libm.so.6", "libc.so.6"]);
    }

    #[test]
    fn test_parse_static_binary() {
        assert!(parse_needed("\nThere is no dynamic section in this file.\n").is_empty());
    }

    #[test]
    fn test_missing_tool_is_metadata_failure() {
        let inspector = ReadelfInspector::with_tool(PathBuf::from("/nonexistent/readelf"));
        assert!(matches!(
            inspector.needed_libraries(Path::new("/bin/sh")),
            Err(ImageError::MetadataToolFailure { .. })
        ));
    }
}
