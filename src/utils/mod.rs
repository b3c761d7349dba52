//! Shared utility functions.
//!
//! - [`content_length`] - `Content-Length` and `Content-Range` parsing

pub mod content_length;

pub use content_length::{content_range, parse_content_length, parse_content_range, ContentRange};
