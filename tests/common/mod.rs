//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test workspace context
///
/// Creates a temporary directory used both as the crossroot workspace root
/// and as the home of test manifests.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Pre-populate the source index so acquisition needs no network
    ///
    /// Each package gets an empty source directory under `source/`.
    pub fn seed_sources(&self, names: &[&str]) {
        let mut index = BTreeMap::new();
        for name in names {
            let dir = self.path().join("source").join(format!("{name}-1.0"));
            std::fs::create_dir_all(&dir).expect("Failed to create source directory");
            index.insert((*name).to_string(), dir);
        }
        let json = serde_json::to_string_pretty(&index).expect("Failed to serialize index");
        self.create_file("source/valid_sources", &json);
    }

    /// Run crossroot with this project as the workspace
    pub fn run(&self, args: &[&str]) -> Output {
        run_crossroot(&self.path(), args)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the crossroot binary in `workdir` with a clean environment for its variables
pub fn run_crossroot(workdir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crossroot"))
        .current_dir(workdir)
        .env_remove("CROSSROOT_WORK_DIR")
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute crossroot")
}

/// Stdout of a finished command
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished command
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Diamond-shaped manifest: musl <- zlib, musl <- openssl, both <- dropbear
pub const DIAMOND_MANIFEST: &str = r#"
cross_compiler = "arm-linux-musleabihf-"
oauth_token = "test-token"

[[packages]]
name = "dropbear"
repo = "https://github.com/mkj/dropbear"
depends = ["zlib", "openssl"]

[[packages]]
name = "zlib"
repo = "https://github.com/madler/zlib"
depends = ["musl"]

[[packages]]
name = "openssl"
repo = "https://github.com/openssl/openssl"
depends = ["musl"]

[[packages]]
name = "musl"
repo = "https://github.com/richfelker/musl"
"#;

/// Two packages depending on each other
pub const CYCLIC_MANIFEST: &str = r#"
[[packages]]
name = "a"
repo = "https://github.com/test/a"
depends = ["b"]

[[packages]]
name = "b"
repo = "https://github.com/test/b"
depends = ["a"]
"#;
