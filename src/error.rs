//! Error handling for butler.
//!
//! Every failure a download can run into is a variant of [`Error`]. Callers
//! that need to react differently to different failures (retry an integrity
//! failure, give up on a bad URL) should go through [`Error::kind`] and the
//! classification predicates instead of matching on individual variants.

use crate::download::HashAlgorithm;

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors that can happen when using butler.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// Captures internal errors that don't fit into other categories.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The source URL is missing, cannot be parsed, or is not HTTP(S).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The destination path is missing or unusable.
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// A custom request header could not be parsed.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The server answered with a non-2xx status.
    #[error("server error: http {status}")]
    HttpStatus { status: StatusCode },

    /// A ranged request was answered with something other than the
    /// requested range.
    #[error("server did not honor range request from byte {offset}: {reason}")]
    RangeNotHonored { offset: u64, reason: String },

    /// I/O Error on the local file system.
    ///
    /// Wraps errors that occur while creating, appending to, truncating or
    /// reading the destination file.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error while reading the response body.
    #[error("error while streaming response body: {source}")]
    Stream { source: io::Error },

    /// Error from the Reqwest library.
    #[error("Reqwest Error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the middleware stack wrapping the HTTP client.
    #[error("HTTP client error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// The file on disk does not have the size the server declared.
    #[error("size on disk didn't match expected size: wanted {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// A checked digest does not match the one computed from the file.
    #[error("{algorithm} hash mismatch: wanted {}, got {}", hex::encode(.expected), hex::encode(.actual))]
    HashMismatch {
        algorithm: HashAlgorithm,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; retrying cannot help.
    Configuration,
    /// Network failure, unexpected status, or broken body stream.
    Transport,
    /// Local file system failure.
    Storage,
    /// Final size disagrees with the declared length.
    SizeMismatch,
    /// A digest disagrees with the declared one.
    HashMismatch,
    /// Bug or unexpected state.
    Internal,
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUrl(_) | Error::InvalidDestination(_) | Error::InvalidHeader(_) => {
                ErrorKind::Configuration
            }
            Error::HttpStatus { .. }
            | Error::RangeNotHonored { .. }
            | Error::Stream { .. }
            | Error::Reqwest { .. }
            | Error::Middleware { .. } => ErrorKind::Transport,
            Error::IOError { .. } => ErrorKind::Storage,
            Error::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Error::HashMismatch { .. } => ErrorKind::HashMismatch,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Return `true` if the downloaded content itself was found corrupt.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::SizeMismatch | ErrorKind::HashMismatch
        )
    }

    /// Return `true` if a fresh attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Configuration | ErrorKind::Internal)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpStatus { status } => Some(*status),
            Error::Reqwest { source } => source.status(),
            Error::Middleware {
                source: reqwest_middleware::Error::Reqwest(source),
            } => source.status(),
            _ => None,
        }
    }
}

/// Result type alias for operations that can fail with a butler error.
pub type Result<T> = std::result::Result<T, Error>;
