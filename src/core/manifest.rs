//! Manifest parsing and validation
//!
//! The manifest declares the packages to build, the replacement table used
//! in command templates, the cross-compiler prefix and image settings.
//! TOML is the native format; files ending in `.json` are parsed as JSON.
//! The oauth token supports environment variable substitution using
//! `${VAR}` syntax.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::{defaults, urls};
use crate::core::package::Package;
use crate::error::ManifestError;

/// The build manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Cross-compiler prefix (e.g. `arm-linux-musleabihf-`)
    #[serde(default)]
    pub cross_compiler: String,

    /// Token for the tag lookup service
    #[serde(default)]
    pub oauth_token: Option<String>,

    /// `$key$` placeholder values for command templates
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,

    /// Packages to build
    #[serde(default)]
    pub packages: Vec<Package>,

    /// Image assembly settings
    #[serde(default)]
    pub image_settings: ImageSettings,

    /// Service endpoint overrides
    #[serde(default)]
    pub services: ServiceConfig,
}

/// Image assembly settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSettings {
    /// Library root of the cross-compiler sysroot, searched last
    #[serde(default)]
    pub cross_compiler_lib_root: Option<PathBuf>,

    /// Library search directories, in priority order
    #[serde(default, rename = "ld_library_paths")]
    pub search_paths: Vec<PathBuf>,

    /// Glob patterns (relative to the build root) selecting key executables
    #[serde(default)]
    pub executables: Vec<String>,

    /// Static configuration tree copied over the image root
    #[serde(default)]
    pub config_overlay: Option<PathBuf>,

    /// Strip debug symbols from every file in the image
    #[serde(default)]
    pub strip: bool,

    /// Directory (inside the image root) receiving resolved libraries
    #[serde(default = "default_library_dir")]
    pub library_dir: String,

    /// Root the executable patterns are matched against (defaults to the source directory)
    #[serde(default)]
    pub build_root: Option<PathBuf>,

    /// Packaged image file name
    #[serde(default = "default_image_name")]
    pub output: String,

    /// Packaging command; `{root}` and `{output}` are substituted
    #[serde(default = "default_packager")]
    pub packager: String,
}

fn default_library_dir() -> String {
    defaults::LIBRARY_DIR.to_string()
}

fn default_image_name() -> String {
    defaults::IMAGE_NAME.to_string()
}

fn default_packager() -> String {
    defaults::PACKAGER.to_string()
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            cross_compiler_lib_root: None,
            search_paths: Vec::new(),
            executables: Vec::new(),
            config_overlay: None,
            strip: false,
            library_dir: default_library_dir(),
            build_root: None,
            output: default_image_name(),
            packager: default_packager(),
        }
    }
}

impl ImageSettings {
    /// Ordered library search directories
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.search_paths.clone();
        if let Some(ref root) = self.cross_compiler_lib_root {
            dirs.push(root.clone());
        }
        dirs
    }
}

/// External service endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Tag lookup (GraphQL) endpoint
    #[serde(default = "default_tag_endpoint")]
    pub tag_endpoint: String,

    /// Host serving `<owner>/<name>/archive/<commit>.tar.gz`
    #[serde(default = "default_archive_host")]
    pub archive_host: String,
}

fn default_tag_endpoint() -> String {
    urls::GITHUB_GRAPHQL.to_string()
}

fn default_archive_host() -> String {
    urls::GITHUB_ARCHIVE_HOST.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tag_endpoint: default_tag_endpoint(),
            archive_host: default_archive_host(),
        }
    }
}

/// Placeholder table applied to command templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitutions {
    replacements: BTreeMap<String, String>,
    cross_compiler: String,
}

impl Substitutions {
    /// Create a substitution table
    pub fn new(replacements: BTreeMap<String, String>, cross_compiler: &str) -> Self {
        Self {
            replacements,
            cross_compiler: cross_compiler.to_string(),
        }
    }

    /// Cross-compiler prefix
    pub fn cross_compiler(&self) -> &str {
        &self.cross_compiler
    }

    /// Replace every `$key$` with its value, then `$cross_compiler$` with the prefix
    pub fn apply(&self, template: &str) -> String {
        let mut out = template.to_string();
        for (key, value) in &self.replacements {
            out = out.replace(&format!("${key}$"), value);
        }
        out.replace(
            &format!("${}$", defaults::CROSS_COMPILER_TOKEN),
            &self.cross_compiler,
        )
    }
}

impl Manifest {
    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let manifest = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
        .map_err(|error| ManifestError::Parse {
            path: path.to_path_buf(),
            error,
        })?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Parse from JSON string
    pub fn from_json(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Check package names are present and unique
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::new();
        for (index, pkg) in self.packages.iter().enumerate() {
            if pkg.name.trim().is_empty() {
                return Err(ManifestError::UnnamedPackage { index });
            }
            if !seen.insert(pkg.name.as_str()) {
                return Err(ManifestError::DuplicatePackage {
                    name: pkg.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Placeholder table for command templates
    pub fn substitutions(&self) -> Substitutions {
        Substitutions::new(self.replacements.clone(), &self.cross_compiler)
    }

    /// Look up a package by name
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Resolve the tag lookup token
    ///
    /// The manifest value wins (after `${VAR}` substitution); otherwise the
    /// `GITHUB_TOKEN` environment variable is used.
    pub fn token(&self) -> Result<Option<String>, ManifestError> {
        if let Some(ref raw) = self.oauth_token {
            let token = substitute_env_vars(raw).map_err(ManifestError::Substitution)?;
            if !token.trim().is_empty() {
                return Ok(Some(token.trim().to_string()));
            }
        }
        Ok(std::env::var(defaults::TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty()))
    }
}

/// Substitute environment variables in a string using `${VAR}` syntax.
///
/// Unset variables expand to the empty string.
///
/// # Examples
/// ```
/// use crossroot::core::manifest::substitute_env_vars;
///
/// std::env::set_var("CROSSROOT_DOC_VAR", "hello");
/// let result = substitute_env_vars("prefix_${CROSSROOT_DOC_VAR}_suffix").unwrap();
/// assert_eq!(result, "prefix_hello_suffix");
/// std::env::remove_var("CROSSROOT_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> Result<String, String> {
    let re =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| format!("Invalid regex: {e}"))?;

    let out = re.replace_all(input, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_default()
    });

    Ok(out.into_owned())
}
