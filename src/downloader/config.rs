//! Configuration structures and defaults for the downloader.

use super::fetch::CHUNK_SIZE;
use crate::download::VerificationPolicy;

use reqwest::header::HeaderMap;

/// Configuration structure for the downloader
#[derive(Clone, Debug)]
pub struct DownloaderConfig {
    /// Maximum number of attempts, including the first one.
    pub attempts: u32,
    /// Which declared digests are checked.
    pub policy: VerificationPolicy,
    /// Bytes copied from the response body per chunk.
    pub chunk_size: usize,
    /// Transport-level retries for transient HTTP failures.
    pub transport_retries: u32,
    /// Optional proxy configuration.
    pub proxy: Option<reqwest::Proxy>,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
}

impl DownloaderConfig {
    /// Default maximum number of attempts.
    pub const DEFAULT_ATTEMPTS: u32 = 3;
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            attempts: Self::DEFAULT_ATTEMPTS,
            policy: VerificationPolicy::Standard,
            chunk_size: CHUNK_SIZE,
            transport_retries: 0,
            proxy: None,
            headers: None,
        }
    }
}
