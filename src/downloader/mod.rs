//! The downloader: probing, ranged fetching, verification and retries.
//!
//! # Overview
//!
//! - `downloader` - The [`Downloader`] orchestrating attempts and retries
//! - `fetch` - The `HEAD` probe and the ranged `GET` that appends to disk
//! - `builder` - [`DownloaderBuilder`] for configuring a downloader
//! - `config` - [`DownloaderConfig`] and its defaults
//!
//! # Examples
//!
//! ```rust
//! use butler::downloader::DownloaderBuilder;
//!
//! let downloader = DownloaderBuilder::new().build();
//! assert_eq!(downloader.attempts(), 3);
//! ```

pub mod builder;
pub mod config;
pub mod downloader;
pub mod fetch;

pub use builder::DownloaderBuilder;
pub use config::DownloaderConfig;
pub use downloader::Downloader;
pub use fetch::{fetch_remainder, probe, Fetched, Probe, TransferState, CHUNK_SIZE};
