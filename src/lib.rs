//! Butler downloads a single file over HTTP(S), resuming from whatever part
//! of it is already on disk, and checks the result against the size and
//! checksums the server declares.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use butler::{Download, DownloaderBuilder, Error};
//! use butler::progress::JsonLines;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let download = Download::new(
//!     "https://github.com/seanmonstar/reqwest/archive/refs/tags/v0.11.9.zip",
//!     "output/reqwest.zip",
//! )?;
//! let downloader = DownloaderBuilder::new().build();
//! downloader.download(&download, &JsonLines::stdout()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - The download target, digest hints and integrity checks
//! - [`downloader`] - The [`Downloader`], its builder, and the ranged fetcher
//! - [`error`] - The [`Error`] enum and its classification
//! - [`http`] - HTTP client construction
//! - [`progress`] - The status channel
//! - [`utils`] - Header parsing helpers

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;
pub mod utils;

pub use download::{
    AttemptOutcome, AttemptPhase, Download, ExpectedDigest, HashAlgorithm, Summary, Verdict,
    VerificationPolicy,
};
pub use downloader::{Downloader, DownloaderBuilder, TransferState};
pub use error::{Error, ErrorKind, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::{JsonLines, ProgressDisplay, Recorder, StatusMessage, StatusSink};
