//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ```rust
//! use butler::downloader::DownloaderBuilder;
//! use reqwest::header::{HeaderValue, AUTHORIZATION};
//!
//! let downloader = DownloaderBuilder::new()
//!     .attempts(5)
//!     .thorough(true)
//!     .header(AUTHORIZATION, HeaderValue::from_static("Bearer token"))
//!     .build();
//! assert_eq!(downloader.attempts(), 5);
//! ```

use super::{config::DownloaderConfig, downloader::Downloader};
use crate::download::VerificationPolicy;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};

/// A builder used to create a [`Downloader`].
///
/// ```rust
/// # fn main()  {
/// use butler::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().attempts(1).build();
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Set the maximum number of attempts, including the first one.
    ///
    /// Values below 1 are treated as 1.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.config.attempts = attempts.max(1);
        self
    }

    /// Set the verification policy.
    pub fn policy(mut self, policy: VerificationPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Check MD5 digests in addition to CRC32C ones.
    pub fn thorough(self, thorough: bool) -> Self {
        self.policy(VerificationPolicy::from_thorough(thorough))
    }

    /// Set the number of bytes copied per chunk while streaming.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size.max(1);
        self
    }

    /// Retry transient HTTP failures inside a single request.
    pub fn transport_retries(mut self, retries: u32) -> Self {
        self.config.transport_retries = retries;
        self
    }

    /// Send every request through `proxy`.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// You need to pass in a `HeaderMap`, not a `HeaderName`.
    /// `HeaderMap` is a set of http headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add the http header
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Create the [`Downloader`] with the specified options.
    pub fn build(self) -> Downloader {
        Downloader::new(self.config)
    }
}
