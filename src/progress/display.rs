//! Terminal rendering of the status channel.
//!
//! [`ProgressDisplay`] is a [`StatusSink`] that draws percent records on an
//! indicatif bar and prints informational records above it, for people
//! running the tool by hand. Scripts should use
//! [`JsonLines`](super::JsonLines) instead.

use super::channel::{StatusMessage, StatusSink};
use super::style::ProgressBarOpts;

use console::style;
use indicatif::ProgressBar;

/// Human-readable status display.
pub struct ProgressDisplay {
    bar: ProgressBar,
    opts: ProgressBarOpts,
}

impl ProgressDisplay {
    /// Create a display with a 0-100 bar styled by `opts`.
    pub fn new(opts: ProgressBarOpts) -> Self {
        let bar = opts.clone().to_progress_bar(100);
        Self { bar, opts }
    }

    /// Current bar position, in percent.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new(ProgressBarOpts::default())
    }
}

impl StatusSink for ProgressDisplay {
    fn send(&self, record: StatusMessage) {
        match record {
            StatusMessage::Progress { percent } => {
                // A retry starts the bar over.
                if u64::from(percent) < self.bar.position() {
                    self.bar.reset();
                }
                self.bar.set_position(u64::from(percent));
            }
            StatusMessage::Message { message } => {
                self.bar.set_message(message.clone());
                self.bar.println(format!("  {}", style(message).dim()));
            }
            StatusMessage::Error { error } => {
                self.bar
                    .abandon_with_message(style(&error).red().to_string());
                eprintln!("{} {}", style("error:").red().bold(), error);
            }
        }
    }

    fn finish(&self) {
        if self.bar.is_finished() {
            return;
        }
        if self.opts.clear {
            self.bar.finish_and_clear();
        } else {
            self.bar.finish();
        }
    }
}
