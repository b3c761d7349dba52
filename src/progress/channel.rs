//! The status channel: one self-describing record per line.
//!
//! Three record shapes exist, and consumers tell them apart by their single
//! key:
//!
//! ```text
//! {"message":"Asking for range bytes=400-"}
//! {"percent":40}
//! {"error":"server error: http 416 Range Not Satisfiable"}
//! ```
//!
//! Percent records are non-decreasing within one attempt and only drop back
//! when a retry starts over.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// A single record on the status channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusMessage {
    /// Informational text.
    Message { message: String },
    /// Progress of the current attempt, 0 to 100.
    Progress { percent: u8 },
    /// Fatal error; nothing follows it.
    Error { error: String },
}

/// Destination for status records.
pub trait StatusSink: Send + Sync {
    /// Emit one record.
    fn send(&self, record: StatusMessage);

    /// Emit an informational record.
    fn message(&self, message: String) {
        self.send(StatusMessage::Message { message });
    }

    /// Emit a progress record.
    fn percent(&self, percent: u8) {
        self.send(StatusMessage::Progress { percent });
    }

    /// Emit a fatal error record.
    fn error(&self, error: String) {
        self.send(StatusMessage::Error { error });
    }

    /// Called once when the operation is over.
    fn finish(&self) {}
}

/// Writes records as JSON lines, flushing after each one.
#[derive(Debug)]
pub struct JsonLines<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonLines<io::Stdout> {
    /// Status channel on the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLines<W> {
    /// Create a channel writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_record(&self, record: &StatusMessage) -> io::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "{}", line)?;
        out.flush()
    }
}

impl<W: Write + Send> StatusSink for JsonLines<W> {
    fn send(&self, record: StatusMessage) {
        if let Err(e) = self.write_record(&record) {
            warn!("could not write status record {:?}: {}", record, e);
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    records: Arc<Mutex<Vec<StatusMessage>>>,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, in emission order.
    pub fn records(&self) -> Vec<StatusMessage> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Text of the informational records.
    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                StatusMessage::Message { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Values of the progress records.
    pub fn percents(&self) -> Vec<u8> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                StatusMessage::Progress { percent } => Some(percent),
                _ => None,
            })
            .collect()
    }
}

impl StatusSink for Recorder {
    fn send(&self, record: StatusMessage) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}
