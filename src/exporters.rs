//! Concrete sink implementations for persisted metric records.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Mutex;

use crate::event::EventRecord;

/// Sink trait implemented by every durable or in-process destination.
///
/// Failures propagate to the caller; sinks never retry on their own.
pub trait MetricSink: Send + Sync {
    /// Append a single record.
    fn append(&self, record: &EventRecord) -> io::Result<()>;

    /// Flush any buffered output.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Backing file path, when the sink is file-backed.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Persist records as JSON lines, one record per line.
pub struct JsonlSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl MetricSink for JsonlSink {
    fn append(&self, record: &EventRecord) -> io::Result<()> {
        let serialised = serde_json::to_string(record).map_err(io::Error::other)?;
        let mut writer = self.writer.lock().expect("jsonl writer mutex poisoned");
        writeln!(writer, "{serialised}")
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.lock().expect("jsonl writer mutex poisoned").flush()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Persist one human-readable line per record for operational tailing.
pub struct NarrativeSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl NarrativeSink {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl MetricSink for NarrativeSink {
    fn append(&self, record: &EventRecord) -> io::Result<()> {
        let level = if record.is_failure() { "ERROR" } else { "INFO" };
        let stamp = record.timestamp.format("%Y-%m-%d %H:%M:%S");
        let mut writer = self.writer.lock().expect("narrative writer mutex poisoned");
        writeln!(writer, "{} - {} - {}", stamp, level, record.narrative())
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.lock().expect("narrative writer mutex poisoned").flush()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Emit records to stdout for rapid prototyping and debugging.
pub struct ConsoleSink;

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl MetricSink for ConsoleSink {
    fn append(&self, record: &EventRecord) -> io::Result<()> {
        let serialised = serde_json::to_string(record).map_err(io::Error::other)?;
        println!("METRIC: {serialised}");
        Ok(())
    }
}

/// Send records through an in-process channel, for tests and live tailing.
pub struct ChannelSink {
    sender: Sender<EventRecord>,
}

impl ChannelSink {
    pub fn new(sender: Sender<EventRecord>) -> Self {
        Self { sender }
    }
}

impl MetricSink for ChannelSink {
    fn append(&self, record: &EventRecord) -> io::Result<()> {
        // A dropped receiver is not a persistence failure.
        let _ = self.sender.send(record.clone());
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}
