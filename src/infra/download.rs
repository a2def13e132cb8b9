//! HTTP download functionality
//!
//! Handles metadata-only revalidation (`HEAD` + `ETag`), streaming
//! downloads to disk, and the token-keyed skip logic.
//! Nothing is retried; a transport failure is reported to the caller.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::defaults;
use crate::core::index::TokenStore;
use crate::error::AcquireError;

/// What a cached fetch did
#[derive(Debug)]
pub enum FetchOutcome {
    /// Content was downloaded
    Downloaded(PathBuf),
    /// Stored token matched the live one; the existing file was kept
    Revalidated(PathBuf),
}

impl FetchOutcome {
    /// Path of the local file
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded(path) | Self::Revalidated(path) => path,
        }
    }

    /// Whether a download happened
    pub fn downloaded(&self) -> bool {
        matches!(self, Self::Downloaded(_))
    }
}

/// HTTP client shared by downloads and tag lookups
///
/// `timeout` bounds a whole request; `connect_timeout` only the connection.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(defaults::HTTP_CONNECT_TIMEOUT_SECS))
        .user_agent(concat!("crossroot/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Download manager for fetching files
#[derive(Debug, Clone)]
pub struct DownloadManager {
    /// HTTP client
    client: reqwest::Client,
}

impl DownloadManager {
    /// Create a new download manager
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }

    /// Fetch the validation token (`ETag`) for a URL with a `HEAD` request
    ///
    /// Returns an empty string when the server answers without an `ETag`
    /// or rejects the `HEAD`; an empty token forces a full download.
    pub async fn validation_token(&self, url: &str) -> Result<String, AcquireError> {
        let response =
            self.client
                .head(url)
                .send()
                .await
                .map_err(|e| AcquireError::DownloadFailure {
                    url: url.to_string(),
                    error: e.to_string(),
                })?;

        if !response.status().is_success() {
            tracing::debug!("HEAD {url} returned {}, no validation token", response.status());
            return Ok(String::new());
        }

        Ok(response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string())
    }

    /// Download `url` to `dest` unless the stored token still matches
    ///
    /// On a full download the stored token is overwritten with the live one.
    pub async fn fetch_cached(
        &self,
        url: &str,
        dest: &Path,
        tokens: &TokenStore,
    ) -> Result<FetchOutcome, AcquireError> {
        let live = self.validation_token(url).await?;

        if tokens.matches(url, &live) && dest.is_file() {
            tracing::debug!("{url} unchanged ({live}), keeping {}", dest.display());
            return Ok(FetchOutcome::Revalidated(dest.to_path_buf()));
        }

        self.download(url, dest).await?;
        tokens.put(url, &live)?;
        Ok(FetchOutcome::Downloaded(dest.to_path_buf()))
    }

    /// Download `url` to `dest`, returning the number of bytes written
    ///
    /// A partially written file is removed on failure.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError> {
        let result = self.download_once(url, dest).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }

    async fn download_once(&self, url: &str, dest: &Path) -> Result<u64, AcquireError> {
        let network = |error: String| AcquireError::DownloadFailure {
            url: url.to_string(),
            error,
        };
        let io = |error: std::io::Error| AcquireError::Io {
            path: dest.to_path_buf(),
            error: error.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(network(format!("HTTP {}", response.status())));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }

        let mut file = File::create(dest).await.map_err(io)?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| network(e.to_string()))?;

            file.write_all(&chunk).await.map_err(io)?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await.map_err(io)?;
        tracing::debug!("Downloaded {downloaded} bytes to {}", dest.display());

        Ok(downloaded)
    }
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}
