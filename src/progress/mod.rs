//! Status reporting.
//!
//! Everything a download has to tell the outside world goes through a
//! [`StatusSink`] as a [`StatusMessage`]. The default sink is [`JsonLines`]
//! on standard output; [`ProgressDisplay`] renders the same records on a
//! terminal progress bar, and [`Recorder`] keeps them in memory.
//!
//! # Examples
//!
//! ```rust
//! use butler::progress::{JsonLines, StatusSink};
//!
//! let channel = JsonLines::new(Vec::new());
//! channel.message("existing file is 400 bytes long".to_string());
//! channel.percent(40);
//!
//! let out = String::from_utf8(channel.into_inner()).unwrap();
//! assert_eq!(
//!     out,
//!     "{\"message\":\"existing file is 400 bytes long\"}\n{\"percent\":40}\n"
//! );
//! ```

pub(crate) mod channel;
pub(crate) mod display;
pub(crate) mod style;

pub use channel::{JsonLines, Recorder, StatusMessage, StatusSink};
pub use display::ProgressDisplay;
pub use style::ProgressBarOpts;
