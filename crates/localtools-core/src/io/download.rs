//! Download cache.
//!
//! Artifacts are stored flat under the cache root, one file per cache key.
//! An existing entry is returned without touching the network. New entries
//! are streamed into a hidden temp file beside the final path and renamed
//! into place only once the body is complete, so an interrupted or failed
//! download never leaves a truncated file under the cache key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use localtools_schema::DownloadSpec;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::Reporter;

/// Errors fetching into the download cache.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The server answered with a non-success status.
    #[error("error fetching {url}: HTTP status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Connection or body transfer failed.
    #[error("error fetching {url}: {source}")]
    Http {
        /// Requested URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The download did not complete in time.
    #[error("timed out after {secs}s fetching {url}")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured limit in seconds.
        secs: u64,
    },

    /// The cache key is not a plain file name.
    #[error("invalid cache key {key:?}")]
    InvalidCacheKey {
        /// The rejected key.
        key: String,
    },

    /// Cache directory or temp file failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Maps download specs to files in a shared cache directory.
#[derive(Debug, Clone)]
pub struct DownloadCache {
    dir: PathBuf,
    client: Client,
    timeout: Option<Duration>,
}

impl DownloadCache {
    /// A cache rooted at `dir`, fetching with `client`.
    pub fn new(dir: impl Into<PathBuf>, client: Client) -> Self {
        Self {
            dir: dir.into(),
            client,
            timeout: None,
        }
    }

    /// Abort any single download that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The cache root (may not exist yet).
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensure the cache root exists and return it.
    pub async fn cache_directory(&self) -> Result<PathBuf, DownloadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(self.dir.clone())
    }

    /// Path of the entry for `cache_key`, whether or not it exists.
    ///
    /// Keys are plain file names; anything that could address a path
    /// outside the cache root is rejected.
    pub fn entry_path(&self, cache_key: &str) -> Result<PathBuf, DownloadError> {
        let valid = !cache_key.is_empty()
            && cache_key != "."
            && cache_key != ".."
            && !cache_key.contains(['/', '\\', '\0']);
        if !valid {
            return Err(DownloadError::InvalidCacheKey {
                key: cache_key.to_string(),
            });
        }
        Ok(self.dir.join(cache_key))
    }

    /// Return the cached file for `spec`, downloading it first if absent.
    pub async fn fetch(
        &self,
        spec: &DownloadSpec,
        reporter: &dyn Reporter,
    ) -> Result<PathBuf, DownloadError> {
        let dest = self.entry_path(&spec.cache_key)?;
        let dir = self.cache_directory().await?;

        if tokio::fs::try_exists(&dest).await? {
            debug!("Cache hit for {} at {}", spec.cache_key, dest.display());
            reporter.cache_hit(&spec.cache_key);
            return Ok(dest);
        }

        info!("fetching {}", spec.url);
        let download = self.download_into(spec, &dir, &dest, reporter);
        let bytes = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, download).await.map_err(|_| {
                DownloadError::Timeout {
                    url: spec.url.clone(),
                    secs: limit.as_secs(),
                }
            })??,
            None => download.await?,
        };

        info!("Cached {} ({bytes} bytes) at {}", spec.url, dest.display());
        Ok(dest)
    }

    async fn download_into(
        &self,
        spec: &DownloadSpec,
        dir: &Path,
        dest: &Path,
        reporter: &dyn Reporter,
    ) -> Result<u64, DownloadError> {
        let http_err = |source| DownloadError::Http {
            url: spec.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&spec.url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: spec.url.clone(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        debug!("Content-Length: {total:?}");
        reporter.fetching(&spec.url, total);

        // Dropped (and deleted) on any early return, including timeout.
        let partial = tempfile::Builder::new()
            .prefix(&format!(".{}.", spec.cache_key))
            .suffix(".partial")
            .tempfile_in(dir)?;
        let mut file = File::from_std(partial.reopen()?);

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http_err)?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        partial.persist(dest).map_err(|e| e.error)?;
        Ok(downloaded)
    }
}
