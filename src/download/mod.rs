//! Download targets, checksum hints and integrity checks.
//!
//! # Overview
//!
//! - [`download`] - The [`Download`] target and its validation
//! - [`hash`] - Parsing of server-declared digest hints
//! - [`integrity`] - Size and digest verification of the file on disk
//! - [`summary`] - Attempt outcomes and the final [`Summary`]
//!
//! # Examples
//!
//! ```rust
//! use butler::download::{Download, VerificationPolicy};
//!
//! let download = Download::new("https://example.com/file.zip", "file.zip")?;
//! let policy = VerificationPolicy::from_thorough(false);
//! assert_eq!(policy, VerificationPolicy::Standard);
//! # Ok::<(), butler::Error>(())
//! ```

pub mod download;
pub mod hash;
pub mod integrity;
pub mod summary;

pub use download::Download;
pub use hash::{digests_from_headers, parse_digest_hints, ExpectedDigest, HashAlgorithm};
pub use integrity::{check_integrity, Mismatch, Verdict, VerificationPolicy};
pub use summary::{AttemptOutcome, AttemptPhase, Summary};
