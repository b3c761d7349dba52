//! Download orchestration.
//!
//! One attempt is probe, then fetch unless the file is already complete, then
//! verify. Attempts are retried up to the configured limit, and every retry
//! starts from an empty destination: a failed attempt may have left corrupt
//! bytes anywhere in the file, so nothing written before it is trusted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use butler::download::Download;
//! use butler::downloader::DownloaderBuilder;
//! use butler::progress::JsonLines;
//!
//! # async fn example() -> butler::Result<()> {
//! let download = Download::new("https://example.com/file.zip", "file.zip")?;
//! let downloader = DownloaderBuilder::new().thorough(true).build();
//! let summary = downloader.download(&download, &JsonLines::stdout()).await?;
//! println!("{} bytes after {} retries", summary.size(), summary.retries());
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::fetch::{fetch_remainder, probe};
use crate::download::hash::digests_from_headers;
use crate::download::integrity::check_integrity;
use crate::download::{AttemptOutcome, AttemptPhase, Download, Summary, VerificationPolicy};
use crate::error::Result;
use crate::http::{create_http_client, HttpClientConfig};
use crate::progress::StatusSink;

use reqwest::header::HeaderMap;
use reqwest_middleware::ClientWithMiddleware;
use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tracing::{debug, warn};

/// Represents the download controller.
///
/// A downloader can be created via its builder:
///
/// ```rust
/// # fn main()  {
/// use butler::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Downloader {
    config: DownloaderConfig,
}

impl Downloader {
    /// Creates a new Downloader with the given configuration.
    pub(crate) fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Gets the maximum number of attempts.
    pub fn attempts(&self) -> u32 {
        self.config.attempts
    }

    /// Gets the verification policy.
    pub fn policy(&self) -> VerificationPolicy {
        self.config.policy
    }

    /// Gets the streaming chunk size.
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Gets the number of transport-level retries.
    pub fn transport_retries(&self) -> u32 {
        self.config.transport_retries
    }

    /// Gets the custom headers.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.config.headers.as_ref()
    }

    /// Download `download`, resuming from whatever is already on disk.
    ///
    /// Returns the last error once every attempt has failed, or immediately
    /// for errors that a new attempt cannot fix.
    pub async fn download(&self, download: &Download, status: &dyn StatusSink) -> Result<Summary> {
        let client = create_http_client(HttpClientConfig {
            retries: self.config.transport_retries,
            proxy: self.config.proxy.clone(),
            headers: self.config.headers.clone(),
        })?;

        if let Some(dir) = download
            .destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            debug!("Creating destination directory {:?}", dir);
            fs::create_dir_all(dir).await?;
        }

        let mut attempts = Vec::new();
        let mut tries_left = self.config.attempts.max(1);

        loop {
            let mut phase = AttemptPhase::Probing;
            match self.attempt(&client, download, status, &mut phase).await {
                Ok(outcome) => {
                    attempts.push(outcome);
                    return Ok(Summary::new(download.clone(), attempts));
                }
                Err(e) => {
                    warn!("{} failed while {}: {}", download.url, phase, e);
                    status.message(format!("While downloading, got error {}", e));
                    attempts.push(AttemptOutcome::failure(phase, &e));

                    tries_left -= 1;
                    if tries_left == 0 || !e.is_retryable() {
                        return Err(e);
                    }

                    truncate(&download.destination).await?;
                    status.message(format!("Retrying... ({} tries left)", tries_left));
                }
            }
        }
    }

    /// Run one probe, fetch and verify cycle. `phase` tracks how far it got.
    async fn attempt(
        &self,
        client: &ClientWithMiddleware,
        download: &Download,
        status: &dyn StatusSink,
        phase: &mut AttemptPhase,
    ) -> Result<AttemptOutcome> {
        *phase = AttemptPhase::Probing;
        let probed = probe(client, download, status).await?;

        if probed.is_complete() {
            status.message("all downloaded!".to_string());
            *phase = AttemptPhase::Verifying;
            let digests = digests_from_headers(&probed.headers, status);
            check_integrity(
                probed.remote_length,
                &digests,
                &download.destination,
                self.config.policy,
                status,
            )
            .await?;

            return Ok(AttemptOutcome::Success {
                size: probed.remote_length.unwrap_or_default(),
                fast_path: true,
            });
        }

        *phase = AttemptPhase::Fetching;
        let offset = probed.bytes_on_disk.unwrap_or(0);
        let fetched = fetch_remainder(client, download, offset, self.config.chunk_size, status).await?;

        *phase = AttemptPhase::Verifying;
        if let Some(expected) = fetched.expected_length {
            status.message(format!(
                "checking file size. should be {}, is {}",
                expected,
                fetched.state.bytes_on_disk()
            ));
        }
        check_integrity(
            fetched.expected_length,
            &fetched.digests,
            &download.destination,
            self.config.policy,
            status,
        )
        .await?;

        Ok(AttemptOutcome::Success {
            size: fetched.state.bytes_on_disk(),
            fast_path: false,
        })
    }
}

/// Reset the destination to an empty file.
async fn truncate(path: &Path) -> Result<()> {
    debug!("Truncating {:?}", path);
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_truncate_resets_and_creates() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("partial.bin");
        std::fs::write(&existing, vec![7u8; 400]).unwrap();

        truncate(&existing).await.unwrap();
        assert_eq!(std::fs::metadata(&existing).unwrap().len(), 0);

        let missing = dir.path().join("missing.bin");
        truncate(&missing).await.unwrap();
        assert_eq!(std::fs::metadata(&missing).unwrap().len(), 0);
    }
}
