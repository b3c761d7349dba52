//! Content length and range header parsing.
//!
//! Lengths are read from the headers themselves rather than from the body's
//! size hint, which is always zero for `HEAD` responses.

use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_RANGE};

/// Extract the declared `Content-Length`.
///
/// Returns `None` if the header is missing, not valid text, or not a
/// non-negative integer. Servers that do not know the length sometimes send
/// `-1`; that is treated as unknown.
///
/// # Example
///
/// ```rust
/// use butler::utils::parse_content_length;
/// use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_LENGTH, HeaderValue::from_static("600"));
/// assert_eq!(parse_content_length(&headers), Some(600));
/// ```
pub fn parse_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

/// A parsed `Content-Range: bytes start-end/total` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range, inclusive.
    pub end: u64,
    /// Complete length of the resource, if the server knows it.
    pub total: Option<u64>,
}

/// Parse a `Content-Range` header value.
///
/// Unsatisfied-range values (`bytes */1000`) and malformed values yield
/// `None`.
///
/// # Example
///
/// ```rust
/// use butler::utils::{parse_content_range, ContentRange};
///
/// assert_eq!(
///     parse_content_range("bytes 400-999/1000"),
///     Some(ContentRange { start: 400, end: 999, total: Some(1000) })
/// );
/// assert_eq!(parse_content_range("bytes */1000"), None);
/// ```
pub fn parse_content_range(content_range: &str) -> Option<ContentRange> {
    let spec = content_range.trim().strip_prefix("bytes")?.trim_start();
    let (range, total) = spec.split_once('/')?;
    let (start, end) = range.split_once('-')?;

    let start = start.trim().parse::<u64>().ok()?;
    let end = end.trim().parse::<u64>().ok()?;
    if end < start {
        return None;
    }

    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse::<u64>().ok()?),
    };

    Some(ContentRange { start, end, total })
}

/// Extract and parse the `Content-Range` header of a response.
pub fn content_range(headers: &HeaderMap) -> Option<ContentRange> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range)
}
