//! Post-download integrity checks.
//!
//! Once a transfer is complete the destination file is checked against what
//! the server declared: its length, and any digest hints that came with the
//! response. Cheap checks always run; MD5 over the whole file only runs under
//! [`VerificationPolicy::Thorough`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use butler::download::hash::{ExpectedDigest, HashAlgorithm};
//! use butler::download::integrity::{check_digest, Verdict, VerificationPolicy};
//! use std::path::Path;
//!
//! # async fn example() -> butler::Result<()> {
//! let digest = ExpectedDigest::new(HashAlgorithm::Crc32c, vec![0x9f, 0x4d, 0xf1, 0xe8]);
//! let verdict = check_digest(&digest, Path::new("archive.zip"), VerificationPolicy::Standard).await?;
//! assert_eq!(verdict, Verdict::Pass);
//! # Ok(())
//! # }
//! ```

use super::hash::{ExpectedDigest, HashAlgorithm};
use crate::error::{Error, Result};
use crate::progress::StatusSink;

use md5::{Digest, Md5};
use std::path::Path;
use std::time::Instant;
use tokio::{fs, fs::File, io::AsyncReadExt};
use tracing::debug;

/// Size of the reads used to feed file contents to a hasher.
const READ_CHUNK_SIZE: usize = 128 * 1024;

/// How much verification to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationPolicy {
    /// Check sizes and CRC32C digests only.
    #[default]
    Standard,
    /// Additionally check MD5 digests.
    Thorough,
}

impl VerificationPolicy {
    /// Build a policy from a `--thorough` style flag.
    pub fn from_thorough(thorough: bool) -> Self {
        if thorough {
            VerificationPolicy::Thorough
        } else {
            VerificationPolicy::Standard
        }
    }

    /// Return `true` if `algorithm` is checked under this policy.
    pub fn checks(&self, algorithm: &HashAlgorithm) -> bool {
        match algorithm {
            HashAlgorithm::Crc32c => true,
            HashAlgorithm::Md5 => *self == VerificationPolicy::Thorough,
            HashAlgorithm::Unknown(_) => false,
        }
    }
}

/// What a check found wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// File length differs from the declared one.
    Size { expected: u64, actual: u64 },
    /// Computed digest differs from the declared one.
    Hash {
        algorithm: HashAlgorithm,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
}

impl From<Mismatch> for Error {
    fn from(mismatch: Mismatch) -> Self {
        match mismatch {
            Mismatch::Size { expected, actual } => Error::SizeMismatch { expected, actual },
            Mismatch::Hash {
                algorithm,
                expected,
                actual,
            } => Error::HashMismatch {
                algorithm,
                expected,
                actual,
            },
        }
    }
}

/// Result of a single verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The check ran and succeeded.
    Pass,
    /// The check was not applicable under the current policy.
    Skipped,
    /// The check ran and failed.
    Fail(Mismatch),
}

/// Compare the file size with the expected length.
///
/// Servers that report no length, or a length of zero, usually did not know
/// it when they answered (streaming proxies, for example); those are exempt.
pub fn check_size(expected: Option<u64>, actual: u64) -> Verdict {
    match expected {
        Some(expected) if expected > 0 => {
            if expected == actual {
                Verdict::Pass
            } else {
                Verdict::Fail(Mismatch::Size { expected, actual })
            }
        }
        _ => Verdict::Skipped,
    }
}

/// Stream `path` through `algorithm`.
///
/// Returns `None` for algorithms that cannot be computed.
pub async fn compute_digest(algorithm: &HashAlgorithm, path: &Path) -> Result<Option<Vec<u8>>> {
    let mut file = File::open(path).await?;
    let mut buf = vec![0u8; READ_CHUNK_SIZE];

    match algorithm {
        HashAlgorithm::Md5 => {
            let mut hasher = Md5::new();
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(Some(hasher.finalize().to_vec()))
        }
        HashAlgorithm::Crc32c => {
            let mut crc = 0u32;
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                crc = crc32c::crc32c_append(crc, &buf[..n]);
            }
            Ok(Some(crc.to_be_bytes().to_vec()))
        }
        HashAlgorithm::Unknown(_) => Ok(None),
    }
}

/// Check one declared digest against the file at `path`.
pub async fn check_digest(
    digest: &ExpectedDigest,
    path: &Path,
    policy: VerificationPolicy,
) -> Result<Verdict> {
    if !policy.checks(&digest.algorithm) {
        return Ok(Verdict::Skipped);
    }

    let Some(actual) = compute_digest(&digest.algorithm, path).await? else {
        return Ok(Verdict::Skipped);
    };

    if actual == digest.expected {
        Ok(Verdict::Pass)
    } else {
        Ok(Verdict::Fail(Mismatch::Hash {
            algorithm: digest.algorithm.clone(),
            expected: digest.expected.clone(),
            actual,
        }))
    }
}

/// Run the size check and every digest check against `path`.
///
/// Stops at the first failure and returns it as an error. Each check is
/// reported on `status` as it completes.
pub async fn check_integrity(
    expected_len: Option<u64>,
    digests: &[ExpectedDigest],
    path: &Path,
    policy: VerificationPolicy,
    status: &dyn StatusSink,
) -> Result<()> {
    let disk_size = match fs::metadata(path).await {
        Ok(m) => m.len(),
        Err(_) => 0,
    };

    match check_size(expected_len, disk_size) {
        Verdict::Pass => status.message(format!("pass: size ({} bytes)", disk_size)),
        Verdict::Skipped => debug!("size check skipped, server did not declare a length"),
        Verdict::Fail(mismatch) => return Err(mismatch.into()),
    }

    for digest in digests {
        let start = Instant::now();
        match check_digest(digest, path, policy).await? {
            Verdict::Pass => {
                debug!("{} took {:?}", digest.algorithm, start.elapsed());
                status.message(format!(
                    "pass: {} (took {:?})",
                    digest.algorithm,
                    start.elapsed()
                ));
            }
            Verdict::Skipped => {
                let hint = match digest.algorithm {
                    HashAlgorithm::Md5 => " (use --thorough to force check)",
                    _ => "",
                };
                status.message(format!("skip: {}{}", digest.algorithm, hint));
            }
            Verdict::Fail(mismatch) => {
                if let Mismatch::Hash {
                    expected, actual, ..
                } = &mismatch
                {
                    status.message(format!("given    = {}", hex::encode(expected)));
                    status.message(format!("computed = {}", hex::encode(actual)));
                }
                return Err(mismatch.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Recorder;
    use std::io::Write;

    fn temp_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    // Check value from RFC 3720, appendix B.4.
    const CRC32C_123456789: [u8; 4] = [0xe3, 0x06, 0x92, 0x83];
    // MD5 of "123456789".
    const MD5_123456789: &str = "25f9e794323b453885f5181f1b624d0b";

    #[test]
    fn test_check_size() {
        assert_eq!(check_size(Some(10), 10), Verdict::Pass);
        assert_eq!(
            check_size(Some(10), 7),
            Verdict::Fail(Mismatch::Size {
                expected: 10,
                actual: 7
            })
        );
        assert_eq!(check_size(Some(0), 7), Verdict::Skipped);
        assert_eq!(check_size(None, 7), Verdict::Skipped);
    }

    #[test]
    fn test_policy() {
        let standard = VerificationPolicy::Standard;
        let thorough = VerificationPolicy::from_thorough(true);
        assert!(standard.checks(&HashAlgorithm::Crc32c));
        assert!(!standard.checks(&HashAlgorithm::Md5));
        assert!(thorough.checks(&HashAlgorithm::Md5));
        assert!(!thorough.checks(&HashAlgorithm::Unknown("sha1".into())));
    }

    #[tokio::test]
    async fn test_compute_known_digests() {
        let file = temp_file(b"123456789");
        let crc = compute_digest(&HashAlgorithm::Crc32c, file.path())
            .await
            .unwrap();
        assert_eq!(crc, Some(CRC32C_123456789.to_vec()));

        let md5 = compute_digest(&HashAlgorithm::Md5, file.path()).await.unwrap();
        assert_eq!(md5.map(hex::encode), Some(MD5_123456789.to_string()));

        let unknown = compute_digest(&HashAlgorithm::Unknown("sha1".into()), file.path())
            .await
            .unwrap();
        assert_eq!(unknown, None);
    }

    #[tokio::test]
    async fn test_check_digest_verdicts() {
        let file = temp_file(b"123456789");
        let good = ExpectedDigest::new(HashAlgorithm::Crc32c, CRC32C_123456789.to_vec());
        let bad = ExpectedDigest::new(HashAlgorithm::Crc32c, vec![0, 0, 0, 0]);
        let md5 = ExpectedDigest::new(HashAlgorithm::Md5, vec![0; 16]);

        let policy = VerificationPolicy::Standard;
        assert_eq!(check_digest(&good, file.path(), policy).await.unwrap(), Verdict::Pass);
        assert_eq!(
            check_digest(&bad, file.path(), policy).await.unwrap(),
            Verdict::Fail(Mismatch::Hash {
                algorithm: HashAlgorithm::Crc32c,
                expected: vec![0, 0, 0, 0],
                actual: CRC32C_123456789.to_vec(),
            })
        );
        assert_eq!(check_digest(&md5, file.path(), policy).await.unwrap(), Verdict::Skipped);
        assert!(matches!(
            check_digest(&md5, file.path(), VerificationPolicy::Thorough)
                .await
                .unwrap(),
            Verdict::Fail(_)
        ));
    }

    #[tokio::test]
    async fn test_check_digest_is_idempotent() {
        let file = temp_file(b"some content that does not change");
        let digest = ExpectedDigest::new(HashAlgorithm::Crc32c, vec![1, 2, 3, 4]);

        let first = check_digest(&digest, file.path(), VerificationPolicy::Standard)
            .await
            .unwrap();
        let second = check_digest(&digest, file.path(), VerificationPolicy::Standard)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_check_integrity_reports_each_check() {
        let file = temp_file(b"123456789");
        let digests = vec![
            ExpectedDigest::new(HashAlgorithm::Md5, vec![0; 16]),
            ExpectedDigest::new(HashAlgorithm::Crc32c, CRC32C_123456789.to_vec()),
            ExpectedDigest::new(HashAlgorithm::Unknown("sha1".into()), vec![0; 20]),
        ];
        let status = Recorder::new();

        check_integrity(
            Some(9),
            &digests,
            file.path(),
            VerificationPolicy::Standard,
            &status,
        )
        .await
        .unwrap();

        let messages = status.messages();
        assert_eq!(messages[0], "pass: size (9 bytes)");
        assert_eq!(messages[1], "skip: md5 (use --thorough to force check)");
        assert!(messages[2].starts_with("pass: crc32c"));
        assert_eq!(messages[3], "skip: sha1");
    }

    #[tokio::test]
    async fn test_check_integrity_stops_at_first_failure() {
        let file = temp_file(b"123456789");
        let digests = vec![
            ExpectedDigest::new(HashAlgorithm::Crc32c, vec![0, 0, 0, 0]),
            ExpectedDigest::new(HashAlgorithm::Md5, vec![0; 16]),
        ];
        let status = Recorder::new();

        let err = check_integrity(
            None,
            &digests,
            file.path(),
            VerificationPolicy::Thorough,
            &status,
        )
        .await
        .unwrap_err();

        assert!(err.is_integrity_error());
        assert!(matches!(
            err,
            Error::HashMismatch {
                algorithm: HashAlgorithm::Crc32c,
                ..
            }
        ));
        assert!(!status.messages().iter().any(|m| m.contains("md5")));
    }

    #[tokio::test]
    async fn test_check_integrity_size_mismatch() {
        let file = temp_file(b"12345");
        let status = Recorder::new();
        let err = check_integrity(
            Some(9),
            &[],
            file.path(),
            VerificationPolicy::Standard,
            &status,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 9,
                actual: 5
            }
        ));
    }
}
