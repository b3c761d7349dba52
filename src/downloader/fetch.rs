//! Probe and ranged retrieval.
//!
//! A transfer is two requests. A `HEAD` probe learns the remote length, which
//! tells whether the file on disk is already complete. If it is not, a `GET`
//! with `Range: bytes=<size on disk>-` asks for the rest, and the body is
//! appended to the destination in fixed-size chunks.

use crate::download::hash::{digests_from_headers, ExpectedDigest};
use crate::download::Download;
use crate::error::{Error, Result};
use crate::progress::StatusSink;
use crate::utils::content_length::{content_range, parse_content_length};

use futures::TryStreamExt;
use reqwest::{
    header::{HeaderMap, RANGE},
    StatusCode,
};
use reqwest_middleware::ClientWithMiddleware;
use std::io;
use std::pin::pin;
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Default number of bytes copied from the body per chunk.
pub const CHUNK_SIZE: usize = 128 * 1024;

/// Byte accounting for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferState {
    /// Size of the destination before the fetch started.
    pub bytes_already_on_disk: u64,
    /// Bytes appended during this fetch.
    pub bytes_written_this_attempt: u64,
    /// Size the file should have once complete, if known.
    pub total_expected_bytes: Option<u64>,
}

impl TransferState {
    /// Create a fresh state for a fetch resuming at `bytes_already_on_disk`.
    pub fn new(bytes_already_on_disk: u64, total_expected_bytes: Option<u64>) -> Self {
        Self {
            bytes_already_on_disk,
            bytes_written_this_attempt: 0,
            total_expected_bytes,
        }
    }

    /// Size of the destination so far.
    pub fn bytes_on_disk(&self) -> u64 {
        self.bytes_already_on_disk + self.bytes_written_this_attempt
    }

    /// Completion in percent, or `None` when the total is unknown.
    ///
    /// An empty resource is complete from the start.
    pub fn percent(&self) -> Option<u8> {
        match self.total_expected_bytes? {
            0 => Some(100),
            total => {
                let percent = u128::from(self.bytes_on_disk()) * 100 / u128::from(total);
                Some(percent.min(100) as u8)
            }
        }
    }

    fn record(&mut self, written: u64) {
        self.bytes_written_this_attempt += written;
    }
}

/// What the probe learned.
#[derive(Debug, Clone)]
pub struct Probe {
    /// Declared length of the remote resource.
    pub remote_length: Option<u64>,
    /// Size of the destination, `None` if it does not exist.
    pub bytes_on_disk: Option<u64>,
    /// Headers of the probe response.
    pub headers: HeaderMap,
}

impl Probe {
    /// Return `true` if the destination already holds the whole resource.
    ///
    /// A declared length of zero usually means the server did not know it,
    /// so an empty destination is never considered complete.
    pub fn is_complete(&self) -> bool {
        match (self.remote_length, self.bytes_on_disk) {
            (Some(remote), Some(local)) => local > 0 && remote == local,
            _ => false,
        }
    }
}

/// Result of a completed fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final byte accounting.
    pub state: TransferState,
    /// Digest hints sent with the response.
    pub digests: Vec<ExpectedDigest>,
    /// Length the file must have, when the server declared a positive one.
    pub expected_length: Option<u64>,
}

/// Learn the remote length and the current size of the destination.
///
/// A server that refuses `HEAD` leaves the length unknown; only failing to
/// reach the server at all is an error.
pub async fn probe(
    client: &ClientWithMiddleware,
    download: &Download,
    status: &dyn StatusSink,
) -> Result<Probe> {
    let bytes_on_disk = match fs::metadata(&download.destination).await {
        Ok(m) => {
            status.message(format!("existing file is {} bytes long", m.len()));
            Some(m.len())
        }
        Err(_) => None,
    };

    let res = client.head(download.url.clone()).send().await?;
    if !res.status().is_success() {
        debug!(
            "HEAD {} answered {}, remote length unknown",
            download.url,
            res.status()
        );
        return Ok(Probe {
            remote_length: None,
            bytes_on_disk,
            headers: HeaderMap::new(),
        });
    }

    let remote_length = parse_content_length(res.headers());
    debug!("HEAD {} declares length {:?}", download.url, remote_length);

    Ok(Probe {
        remote_length,
        bytes_on_disk,
        headers: res.headers().clone(),
    })
}

/// Append everything past `bytes_on_disk` to the destination.
///
/// Progress is reported after every chunk, and only when it increased.
pub async fn fetch_remainder(
    client: &ClientWithMiddleware,
    download: &Download,
    bytes_on_disk: u64,
    chunk_size: usize,
    status: &dyn StatusSink,
) -> Result<Fetched> {
    let byte_range = format!("bytes={}-", bytes_on_disk);
    status.message(format!("Asking for range {}", byte_range));

    let res = client
        .get(download.url.clone())
        .header(RANGE, byte_range)
        .send()
        .await?;

    if !res.status().is_success() {
        return Err(Error::HttpStatus {
            status: res.status(),
        });
    }

    if bytes_on_disk > 0 {
        check_range_honored(res.status(), res.headers(), bytes_on_disk)?;
    }

    match parse_content_length(res.headers()) {
        Some(len) => status.message(format!("Response content length = {}", len)),
        None => status.message("Response content length = unknown".to_string()),
    }

    let (total, expected_length) = expected_sizes(bytes_on_disk, res.headers())?;
    let digests = digests_from_headers(res.headers(), status);

    let mut state = TransferState::new(bytes_on_disk, total);

    debug!("Appending to {:?}", download.destination);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&download.destination)
        .await?;

    let body = res.bytes_stream().map_err(io::Error::other);
    let mut reader = pin!(StreamReader::new(body));
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut last_percent = None;

    loop {
        let n = read_chunk(&mut reader, &mut buf)
            .await
            .map_err(|source| Error::Stream { source })?;
        if n > 0 {
            file.write_all(&buf[..n]).await?;
        }
        state.record(n as u64);

        if let Some(percent) = state.percent() {
            if last_percent.map_or(true, |last| percent > last) {
                status.percent(percent);
                last_percent = Some(percent);
            }
        }

        if n < buf.len() {
            break;
        }
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    status.message("done downloading".to_string());

    Ok(Fetched {
        state,
        digests,
        expected_length,
    })
}

/// Final size of the file according to the response headers.
///
/// Returns the total used for progress, and the length the size check
/// expects. `Content-Length` counts from `offset`; without it the
/// `Content-Range` total is used. A declared length of zero is never
/// checked.
fn expected_sizes(offset: u64, headers: &HeaderMap) -> Result<(Option<u64>, Option<u64>)> {
    let content_length = parse_content_length(headers);
    let total = match content_length {
        Some(len) => Some(offset.checked_add(len).ok_or_else(|| Error::RangeNotHonored {
            offset,
            reason: format!("declared length {} overflows", len),
        })?),
        None => content_range(headers).and_then(|range| range.total),
    };

    let expected = match content_length {
        Some(0) => None,
        _ => total.filter(|total| *total > 0),
    };
    Ok((total, expected))
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
async fn read_chunk<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// A resumed fetch must get back exactly the range it asked for, or the
/// body would be appended at the wrong offset.
fn check_range_honored(status: StatusCode, headers: &HeaderMap, offset: u64) -> Result<()> {
    if status != StatusCode::PARTIAL_CONTENT {
        return Err(Error::RangeNotHonored {
            offset,
            reason: format!("expected 206 Partial Content, got {}", status),
        });
    }

    match content_range(headers) {
        Some(range) if range.start == offset => Ok(()),
        Some(range) => Err(Error::RangeNotHonored {
            offset,
            reason: format!("response starts at byte {}", range.start),
        }),
        None => Err(Error::RangeNotHonored {
            offset,
            reason: "missing or invalid Content-Range".to_string(),
        }),
    }
}
