//! Server-declared checksum hints.
//!
//! Servers such as Google Cloud Storage advertise checksums of the object
//! they serve in the `x-goog-hash` header, one `algorithm=base64(digest)`
//! pair per value:
//!
//! ```text
//! x-goog-hash: crc32c=n03x6A==
//! x-goog-hash: md5=Ojk9c3dhfxgoKVVHYwFbHQ==
//! ```
//!
//! Both repeated headers and comma-folded values are accepted.
//!
//! # Examples
//!
//! ```rust
//! use butler::download::hash::{parse_digest_hints, HashAlgorithm};
//! use butler::progress::Recorder;
//!
//! let status = Recorder::new();
//! let digests = parse_digest_hints(["crc32c=n03x6A==, md5=Ojk9c3dhfxgoKVVHYwFbHQ=="], &status);
//!
//! assert_eq!(digests.len(), 2);
//! assert_eq!(digests[0].algorithm, HashAlgorithm::Crc32c);
//! assert_eq!(digests[0].expected, vec![0x9f, 0x4d, 0xf1, 0xe8]);
//! ```

use crate::progress::StatusSink;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderName};
use std::fmt;
use tracing::warn;

/// Header carrying the digest hints.
pub const GOOG_HASH: HeaderName = HeaderName::from_static("x-goog-hash");

/// Hash algorithms a server may declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5, checked only in thorough mode.
    Md5,
    /// CRC-32C (Castagnoli), always checked.
    Crc32c,
    /// Anything else; recorded but never checked.
    Unknown(String),
}

impl HashAlgorithm {
    /// Parse an algorithm name, case-insensitively.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        match name.to_ascii_lowercase().as_str() {
            "md5" => HashAlgorithm::Md5,
            "crc32c" => HashAlgorithm::Crc32c,
            _ => HashAlgorithm::Unknown(name.to_string()),
        }
    }

    /// Name as it appears in the header.
    pub fn as_str(&self) -> &str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Crc32c => "crc32c",
            HashAlgorithm::Unknown(name) => name,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A digest the downloaded file is expected to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDigest {
    /// Algorithm the digest was computed with.
    pub algorithm: HashAlgorithm,
    /// Raw digest bytes.
    pub expected: Vec<u8>,
}

impl ExpectedDigest {
    /// Create a new [`ExpectedDigest`].
    pub fn new(algorithm: HashAlgorithm, expected: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            expected: expected.into(),
        }
    }
}

/// Parse digest hints out of raw header values.
///
/// Items that cannot be decoded are dropped, with a warning on the status
/// channel. When an algorithm shows up more than once the last value wins,
/// keeping the position of its first appearance.
pub fn parse_digest_hints<I, S>(values: I, status: &dyn StatusSink) -> Vec<ExpectedDigest>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut digests: Vec<ExpectedDigest> = Vec::new();

    for value in values {
        for item in value.as_ref().split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }

            let Some((name, encoded)) = item.split_once('=') else {
                warn!("Ignoring malformed digest hint {:?}", item);
                status.message(format!(
                    "Could not decode hash {}: missing '=', skipping",
                    item
                ));
                continue;
            };

            let algorithm = HashAlgorithm::parse(name);
            let encoded = encoded.trim();
            let expected = match STANDARD.decode(encoded) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Ignoring undecodable {} digest {:?}: {}", algorithm, encoded, e);
                    status.message(format!(
                        "Could not decode base64-encoded {} hash {} because {}, skipping",
                        algorithm, encoded, e
                    ));
                    continue;
                }
            };

            match digests.iter_mut().find(|d| d.algorithm == algorithm) {
                Some(existing) => existing.expected = expected,
                None => digests.push(ExpectedDigest::new(algorithm, expected)),
            }
        }
    }

    digests
}

/// Extract digest hints from response headers.
pub fn digests_from_headers(headers: &HeaderMap, status: &dyn StatusSink) -> Vec<ExpectedDigest> {
    let values = headers
        .get_all(&GOOG_HASH)
        .iter()
        .filter_map(|value| match value.to_str() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring non-ASCII {} header", GOOG_HASH);
                None
            }
        });
    parse_digest_hints(values, status)
}
