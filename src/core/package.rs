//! Package definition handling
//!
//! A package is a unit of source code with a build recipe and named
//! dependencies. Its source directory is unset until acquisition assigns it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A package declared in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    /// Unique package name
    #[serde(default)]
    pub name: String,

    /// Repository URI (`https://github.com/<owner>/<name>`)
    #[serde(rename = "repo")]
    pub repository: String,

    /// Configure command template
    #[serde(default, rename = "configure_opts")]
    pub configure: Option<String>,

    /// Build command template (defaults to a parallel make)
    #[serde(default)]
    pub build: Option<String>,

    /// Install command template, run after the build
    #[serde(default)]
    pub install: Option<String>,

    /// Names of packages that must be built first
    #[serde(default)]
    pub depends: Vec<String>,

    /// Directory of `*.patch` files applied before building
    #[serde(default)]
    pub patches: Option<PathBuf>,

    /// Extracted source directory, assigned by acquisition
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Package {
    /// Create a package with a name and repository
    pub fn new(name: &str, repository: &str) -> Self {
        Self {
            name: name.to_string(),
            repository: repository.to_string(),
            configure: None,
            build: None,
            install: None,
            depends: Vec::new(),
            patches: None,
            source: None,
        }
    }

    /// Set the dependencies
    #[must_use]
    pub fn with_depends(mut self, depends: &[&str]) -> Self {
        self.depends = depends.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the configure template
    #[must_use]
    pub fn with_configure(mut self, configure: &str) -> Self {
        self.configure = Some(configure.to_string());
        self
    }

    /// Set the build command
    #[must_use]
    pub fn with_build(mut self, build: &str) -> Self {
        self.build = Some(build.to_string());
        self
    }

    /// Set the install command
    #[must_use]
    pub fn with_install(mut self, install: &str) -> Self {
        self.install = Some(install.to_string());
        self
    }

    /// Set the patch directory
    #[must_use]
    pub fn with_patches(mut self, patches: PathBuf) -> Self {
        self.patches = Some(patches);
        self
    }

    /// Extracted source directory, if acquisition has run
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Record the extracted source directory
    pub fn set_source(&mut self, path: PathBuf) {
        if let Some(ref existing) = self.source {
            if existing != &path {
                tracing::debug!(
                    "Source of {} moved from {} to {}",
                    self.name,
                    existing.display(),
                    path.display()
                );
            }
        }
        self.source = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_builder() {
        let pkg = Package::new("zlib", "https://github.com/madler/zlib")
            .with_depends(&["musl"])
            .with_configure("./configure --host=$cross_compiler$")
            .with_install("make install");

        assert_eq!(pkg.name, "zlib");
        assert_eq!(pkg.depends, vec!["musl".to_string()]);
        assert!(pkg.build.is_none());
        assert!(pkg.source().is_none());
    }

    #[test]
    fn test_set_source() {
        let mut pkg = Package::new("zlib", "https://github.com/madler/zlib");
        pkg.set_source(PathBuf::from("/work/source/zlib-1.3"));
        assert_eq!(pkg.source(), Some(Path::new("/work/source/zlib-1.3")));
    }

    #[test]
    fn test_package_deserialize_field_names() {
        let json = r#"{
            "name": "busybox",
            "repo": "https://github.com/mirror/busybox",
            "configure_opts": "make defconfig",
            "depends": ["musl"]
        }"#;
        let pkg: Package = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.repository, "https://github.com/mirror/busybox");
        assert_eq!(pkg.configure.as_deref(), Some("make defconfig"));
        assert_eq!(pkg.depends, vec!["musl".to_string()]);
        assert!(pkg.source().is_none());
    }
}
