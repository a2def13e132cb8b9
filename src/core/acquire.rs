//! Source acquisition
//!
//! For every package missing from the source index: resolve the latest tag
//! of its repository, download the tagged archive (skipped when the stored
//! validation token still matches) and extract it. Downloads and
//! extractions each fan out one task per package through a fail-fast
//! [`WorkerPool`]; the first failure aborts the phase and the index is left
//! untouched. On success the new entries are merged into the index, which
//! is rewritten once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::core::index::{SourceIndex, TokenStore};
use crate::core::package::Package;
use crate::error::AcquireError;
use crate::infra::archive;
use crate::infra::dirs::Workspace;
use crate::infra::download::DownloadManager;
use crate::infra::filesystem;
use crate::infra::pool::WorkerPool;
use crate::infra::tags::TagSource;

/// `owner/name` of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryId {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepositoryId {
    /// Parse `https://host/<owner>/<name>` (a trailing `/` or `.git` is accepted)
    pub fn parse(repository: &str) -> Result<Self, AcquireError> {
        let invalid = || AcquireError::InvalidRepositoryFormat {
            repository: repository.to_string(),
        };

        let url = Url::parse(repository.trim()).map_err(|_| invalid())?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(invalid());
        }

        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(invalid)?
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [owner, name] => {
                let name = name.strip_suffix(".git").unwrap_or(name);
                if name.is_empty() {
                    return Err(invalid());
                }
                Ok(Self {
                    owner: (*owner).to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Archive URL of `commit` on `host`
    pub fn archive_url(&self, host: &str, commit: &str) -> String {
        format!(
            "{}/{}/{}/archive/{commit}.tar.gz",
            host.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }

    /// Local archive file name for `tag`
    ///
    /// Only the last path component of the tag is used, so `release/1.0`
    /// becomes `<name>-1.0.tar.gz`.
    pub fn archive_file_name(&self, tag: &str) -> String {
        let tag = tag.rsplit('/').next().unwrap_or(tag);
        format!("{}-{tag}.tar.gz", self.name)
    }
}

/// What acquisition did per package
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AcquireReport {
    /// Served from the source index
    pub cached: Vec<String>,
    /// Archive downloaded
    pub downloaded: Vec<String>,
    /// Stored validation token matched; existing archive reused
    pub revalidated: Vec<String>,
}

impl AcquireReport {
    /// Whether any network download happened
    pub fn fetched_anything(&self) -> bool {
        !self.downloaded.is_empty()
    }
}

/// A package whose archive is on disk
#[derive(Debug)]
struct Fetched {
    name: String,
    archive: PathBuf,
    downloaded: bool,
}

/// Coordinates tag lookup, download and extraction
pub struct SourceAcquirer {
    workspace: Workspace,
    downloader: DownloadManager,
    tags: Option<Arc<dyn TagSource>>,
    archive_host: String,
    pool: WorkerPool,
}

impl std::fmt::Debug for SourceAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAcquirer")
            .field("workspace", &self.workspace)
            .field("archive_host", &self.archive_host)
            .field("pool", &self.pool)
            .field("has_tag_source", &self.tags.is_some())
            .finish()
    }
}

impl SourceAcquirer {
    /// Create an acquirer
    ///
    /// `tags` may be `None` when no credentials are configured; that only
    /// fails once a package actually needs a tag lookup.
    pub fn new(workspace: Workspace, tags: Option<Arc<dyn TagSource>>) -> Self {
        Self {
            workspace,
            downloader: DownloadManager::new(),
            tags,
            archive_host: crate::config::urls::GITHUB_ARCHIVE_HOST.to_string(),
            pool: WorkerPool::unbounded(),
        }
    }

    /// Host serving `<owner>/<name>/archive/<commit>.tar.gz`
    #[must_use]
    pub fn with_archive_host(mut self, host: &str) -> Self {
        self.archive_host = host.to_string();
        self
    }

    /// Bound the number of concurrent tasks per phase
    #[must_use]
    pub fn with_parallel(mut self, limit: Option<usize>) -> Self {
        self.pool = WorkerPool::new(limit);
        self
    }

    /// Use a specific download manager
    #[must_use]
    pub fn with_downloader(mut self, downloader: DownloadManager) -> Self {
        self.downloader = downloader;
        self
    }

    /// Populate the source directory of every package (or only `only`)
    ///
    /// Index entries are trusted as recorded. Packages not in the index are
    /// fetched and extracted concurrently; the merged index is written only
    /// if every task succeeded.
    pub async fn acquire(
        &self,
        packages: &mut [Package],
        only: Option<&str>,
    ) -> Result<AcquireReport, AcquireError> {
        let source_dir = self.workspace.source_dir();
        let cache_dir = self.workspace.cache_dir();
        for dir in [&source_dir, &cache_dir] {
            filesystem::create_dir_all(dir).map_err(|e| AcquireError::Io {
                path: dir.clone(),
                error: e.to_string(),
            })?;
        }

        let mut index = SourceIndex::load(&self.workspace.index_path())?;
        let mut report = AcquireReport::default();
        let mut pending = Vec::new();

        for package in packages
            .iter_mut()
            .filter(|p| only.map_or(true, |name| p.name == name))
        {
            if let Some(path) = index.get(&package.name) {
                tracing::debug!("{} cached at {}", package.name, path.display());
                package.set_source(path.to_path_buf());
                report.cached.push(package.name.clone());
            } else {
                pending.push((package.name.clone(), package.repository.clone()));
            }
        }

        if pending.is_empty() {
            tracing::info!("All {} source(s) cached", report.cached.len());
            return Ok(report);
        }

        let tags = self.tags.clone().ok_or(AcquireError::MissingToken)?;
        tracing::info!("Fetching {} source(s)", pending.len());

        let fetched = self.fetch_all(pending, &tags, &source_dir, &cache_dir).await?;
        for item in &fetched {
            if item.downloaded {
                report.downloaded.push(item.name.clone());
            } else {
                report.revalidated.push(item.name.clone());
            }
        }

        tracing::info!("Extracting {} archive(s)", fetched.len());
        let extracted = self.extract_all(fetched, &source_dir).await?;

        index.merge(extracted.iter().cloned());
        index.save()?;
        tracing::debug!("Source index now holds {} package(s)", index.len());

        for (name, path) in extracted {
            if let Some(package) = packages.iter_mut().find(|p| p.name == name) {
                package.set_source(path);
            }
        }

        report.downloaded.sort();
        report.revalidated.sort();
        Ok(report)
    }

    async fn fetch_all(
        &self,
        pending: Vec<(String, String)>,
        tags: &Arc<dyn TagSource>,
        source_dir: &Path,
        cache_dir: &Path,
    ) -> Result<Vec<Fetched>, AcquireError> {
        let tokens = TokenStore::new(cache_dir.to_path_buf());

        let units = pending
            .into_iter()
            .map(|(name, repository)| {
                let key = name.clone();
                let unit = fetch_one(
                    name,
                    repository,
                    Arc::clone(tags),
                    self.downloader.clone(),
                    tokens.clone(),
                    self.archive_host.clone(),
                    source_dir.to_path_buf(),
                );
                (key, unit)
            })
            .collect();

        self.pool.run(units).await
    }

    async fn extract_all(
        &self,
        fetched: Vec<Fetched>,
        source_dir: &Path,
    ) -> Result<Vec<(String, PathBuf)>, AcquireError> {
        let units = fetched
            .into_iter()
            .map(|item| {
                let key = item.name.clone();
                let dest = source_dir.to_path_buf();
                let unit = async move {
                    let Fetched { name, archive, .. } = item;
                    let task_name = name.clone();
                    let dir = tokio::task::spawn_blocking(move || archive::extract(&archive, &dest))
                        .await
                        .map_err(|e| AcquireError::Task {
                            package: task_name,
                            error: e.to_string(),
                        })??;
                    tracing::debug!("{name} extracted to {}", dir.display());
                    Ok::<_, AcquireError>((name, dir))
                };
                (key, unit)
            })
            .collect();

        self.pool.run(units).await
    }
}

async fn fetch_one(
    name: String,
    repository: String,
    tags: Arc<dyn TagSource>,
    downloader: DownloadManager,
    tokens: TokenStore,
    archive_host: String,
    source_dir: PathBuf,
) -> Result<Fetched, AcquireError> {
    let repo = RepositoryId::parse(&repository)?;
    let tag = tags.latest_tag(&repo.owner, &repo.name).await?;
    tracing::debug!("{name}: latest tag {} at {}", tag.name, tag.commit);

    let url = repo.archive_url(&archive_host, &tag.commit);
    let dest = source_dir.join(repo.archive_file_name(&tag.name));

    let outcome = downloader.fetch_cached(&url, &dest, &tokens).await?;
    Ok(Fetched {
        name,
        downloaded: outcome.downloaded(),
        archive: outcome.path().to_path_buf(),
    })
}
