//! The download target.
//!
//! A [`Download`] pairs a source URL with the path the resource is written
//! to. It is validated once, up front: a bad URL or destination is a
//! configuration error and no request is ever sent for it.
//!
//! # Examples
//!
//! ```rust
//! use butler::download::Download;
//!
//! let download = Download::new("https://example.com/file-0.1.2.zip", "out/file.zip")?;
//! assert_eq!(download.url.as_str(), "https://example.com/file-0.1.2.zip");
//! assert_eq!(download.destination.to_str(), Some("out/file.zip"));
//! # Ok::<(), butler::Error>(())
//! ```

use crate::error::Error;

use reqwest::Url;
use std::convert::TryFrom;
use std::path::{Path, PathBuf};

/// Represents a file to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// URL of the file to download.
    pub url: Url,
    /// Where the file is written on disk.
    pub destination: PathBuf,
}

impl Download {
    /// Creates a new [`Download`].
    ///
    /// When `destination` is an existing directory, the file name is taken
    /// from the last segment of the URL.
    pub fn new(url: &str, destination: impl AsRef<Path>) -> Result<Self, Error> {
        let url = parse_url(url)?;
        let destination = destination.as_ref();

        if destination.as_os_str().is_empty() {
            return Err(Error::InvalidDestination(
                "destination path is empty".to_string(),
            ));
        }

        let destination = if destination.is_dir() {
            destination.join(filename_from_url(&url)?)
        } else {
            destination.to_path_buf()
        };

        Ok(Self { url, destination })
    }
}

fn parse_url(value: &str) -> Result<Url, Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidUrl("source URL is empty".to_string()));
    }

    let url = Url::parse(value)
        .map_err(|e| Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::InvalidUrl(format!(
            "The url \"{}\" uses unsupported scheme \"{}\"",
            value, scheme
        ))),
    }
}

fn filename_from_url(url: &Url) -> Result<String, Error> {
    url.path_segments()
        .ok_or_else(|| {
            Error::InvalidUrl(format!("The url \"{}\" does not contain a valid path", url))
        })?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .map(|(key, val)| [key, val].concat())
                .collect()
        })
        .ok_or_else(|| {
            Error::InvalidUrl(format!("The url \"{}\" does not contain a filename", url))
        })
}

impl TryFrom<&Url> for Download {
    type Error = crate::error::Error;

    /// Download to the current directory, under the URL's file name.
    fn try_from(value: &Url) -> Result<Self, Self::Error> {
        let url = parse_url(value.as_str())?;
        let filename = filename_from_url(&url)?;
        Ok(Download {
            url,
            destination: PathBuf::from(filename),
        })
    }
}

impl TryFrom<&str> for Download {
    type Error = crate::error::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Download::try_from(&parse_url(value)?)
    }
}
