//! HTTP download functionality
//!
//! Fetches source archives into a directory. A file that is already present
//! is never downloaded again, which keeps reruns cheap and repeatable.
//! Failures are not retried.

use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::cli::output::create_download_bar;
use crate::error::FetchError;

/// Result of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File was already present
    Cached(PathBuf),
    /// File was downloaded
    Downloaded {
        /// Path to the downloaded file
        path: PathBuf,
        /// Size in bytes
        size: u64,
    },
}

impl FetchOutcome {
    /// Path of the local file
    pub fn path(&self) -> &Path {
        match self {
            Self::Cached(path) | Self::Downloaded { path, .. } => path,
        }
    }
}

/// Fetches single files from a base URL
#[derive(Debug, Clone)]
pub struct Fetcher {
    /// HTTP client
    client: reqwest::Client,
    /// Draw a progress bar while downloading
    show_progress: bool,
}

impl Fetcher {
    /// Create a new fetcher
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(1800))
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            show_progress: false,
        }
    }

    /// Enable or disable the download progress bar
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fetch `<base_url>/<filename>` into `dir/filename`
    ///
    /// If `dir/filename` already exists nothing is requested. When
    /// `expected_checksum` is given the local file is verified in both cases.
    pub async fn fetch(
        &self,
        base_url: &str,
        filename: &str,
        dir: &Path,
        expected_checksum: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let dest = dir.join(filename);

        let outcome = if dest.is_file() {
            tracing::info!("Using local copy of {filename}");
            FetchOutcome::Cached(dest.clone())
        } else {
            let url = format!("{}/{filename}", base_url.trim_end_matches('/'));
            tracing::info!("Downloading '{filename}' from '{base_url}'...");
            match self.download_once(&url, &dest).await {
                Ok(size) => FetchOutcome::Downloaded {
                    path: dest.clone(),
                    size,
                },
                Err(e) => {
                    // A partial file would be mistaken for a cached copy on the next run
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(e);
                }
            }
        };

        if let Some(expected) = expected_checksum {
            let actual = checksum_file(&dest).await?;
            if !actual.eq_ignore_ascii_case(expected) {
                if matches!(outcome, FetchOutcome::Downloaded { .. }) {
                    let _ = tokio::fs::remove_file(&dest).await;
                }
                return Err(FetchError::ChecksumMismatch {
                    file: dest,
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        Ok(outcome)
    }

    /// Single download attempt
    async fn download_once(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let total_size = response.content_length().unwrap_or(0);
        let bar = self.show_progress.then(|| create_download_bar(total_size));

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::IoError {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }

        let mut file = File::create(dest).await.map_err(|e| FetchError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| FetchError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::IoError {
                    path: dest.to_path_buf(),
                    error: e.to_string(),
                })?;

            downloaded += chunk.len() as u64;
            if let Some(ref bar) = bar {
                bar.set_position(downloaded);
            }
        }

        file.flush().await.map_err(|e| FetchError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        Ok(downloaded)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

async fn checksum_file(path: &Path) -> Result<String, FetchError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| FetchError::IoError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    Ok(compute_checksum(&content))
}
