//! Persisted acquisition caches
//!
//! Two durable maps survive across runs:
//! - [`SourceIndex`]: package name -> extracted source path, stored as JSON
//!   at `source/valid_sources`. Read once when acquisition starts and
//!   rewritten once, atomically, when it finishes.
//! - [`TokenStore`]: URL hash -> HTTP validation token (`ETag`), one file
//!   per URL under `cache/`.
//!
//! Both are discarded by `crossroot clean`.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::AcquireError;
use crate::infra::filesystem;

/// Package name -> extracted source directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceIndex {
    path: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl SourceIndex {
    /// Load the index, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self, AcquireError> {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| AcquireError::Index {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AcquireError::Index {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Cached source path for a package
    ///
    /// The entry is trusted as-is; whether the directory still exists is
    /// not checked here.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    /// Merge new entries, overwriting existing names
    pub fn merge<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        self.entries.extend(entries);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Persist the index atomically
    pub fn save(&self) -> Result<(), AcquireError> {
        let json = serde_json::to_vec_pretty(&self.entries).map_err(|e| AcquireError::Index {
            path: self.path.clone(),
            error: e.to_string(),
        })?;
        filesystem::write_atomic(&self.path, &json).map_err(|e| AcquireError::Index {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }
}

/// URL hash -> validation token
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    /// Create a token store rooted at `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Stable key for a URL (hex SHA-256)
    pub fn key(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Stored token for a URL
    pub fn get(&self, url: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.join(Self::key(url))).ok()
    }

    /// Store (or overwrite) the token for a URL
    pub fn put(&self, url: &str, token: &str) -> Result<(), AcquireError> {
        let path = self.dir.join(Self::key(url));
        filesystem::write_atomic(&path, token.as_bytes()).map_err(|e| AcquireError::Io {
            path,
            error: e.to_string(),
        })
    }

    /// Whether the stored token for `url` equals `live`
    ///
    /// An empty live token never matches; servers that send no `ETag` are
    /// always downloaded.
    pub fn matches(&self, url: &str, live: &str) -> bool {
        !live.is_empty() && self.get(url).as_deref() == Some(live)
    }
}
