//! Download summary.
//!
//! A [`Summary`] records how a download went: every attempt that was made,
//! the final size on disk, and whether the data was already there.

use super::download::Download;
use crate::error::{Error, ErrorKind};

use std::fmt;

/// Phase of an attempt an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// Asking the server for the resource length.
    Probing,
    /// Streaming the remaining bytes to disk.
    Fetching,
    /// Checking the file against the declared size and digests.
    Verifying,
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptPhase::Probing => "probing",
            AttemptPhase::Fetching => "fetching",
            AttemptPhase::Verifying => "verifying",
        };
        f.write_str(name)
    }
}

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The file is complete and verified.
    Success {
        /// Final size of the file, in bytes.
        size: u64,
        /// No bytes were transferred.
        fast_path: bool,
    },
    /// The attempt failed.
    Failure {
        /// Where the attempt stopped.
        phase: AttemptPhase,
        /// Classification of the error.
        kind: ErrorKind,
        /// Error message.
        message: String,
    },
}

impl AttemptOutcome {
    /// Record a failed attempt.
    pub fn failure(phase: AttemptPhase, error: &Error) -> Self {
        AttemptOutcome::Failure {
            phase,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Return `true` for [`AttemptOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success { .. })
    }
}

/// Represents a completed [`Download`] summary.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Downloaded item.
    download: Download,
    /// Every attempt, in order; the last one succeeded.
    attempts: Vec<AttemptOutcome>,
}

impl Summary {
    /// Create a new [`Summary`].
    pub fn new(download: Download, attempts: Vec<AttemptOutcome>) -> Self {
        Self { download, attempts }
    }

    /// Get a reference to the summary's download.
    pub fn download(&self) -> &Download {
        &self.download
    }

    /// Every attempt made.
    pub fn attempts(&self) -> &[AttemptOutcome] {
        &self.attempts
    }

    /// Final size on disk, in bytes.
    pub fn size(&self) -> u64 {
        match self.attempts.last() {
            Some(AttemptOutcome::Success { size, .. }) => *size,
            _ => 0,
        }
    }

    /// Return `true` if the file was already complete on disk.
    pub fn fast_path(&self) -> bool {
        matches!(
            self.attempts.last(),
            Some(AttemptOutcome::Success {
                fast_path: true,
                ..
            })
        )
    }

    /// Number of attempts that failed before the successful one.
    pub fn retries(&self) -> usize {
        self.attempts.iter().filter(|a| !a.is_success()).count()
    }
}
