//! Append-only store fanning records out to the configured sinks.

use crate::error::MetricError;
use crate::event::EventRecord;
use crate::exporters::MetricSink;

/// Ordered, append-only record of every event the collector accepted.
///
/// The in-memory log is canonical: a record is appended to it before any sink
/// runs, so a failing sink can never hide an event from `export` or the
/// aggregates. The log is never truncated or rewritten for the lifetime of
/// the store.
pub struct MetricStore {
    records: Vec<EventRecord>,
    sinks: Vec<Box<dyn MetricSink>>,
}

impl MetricStore {
    /// An in-memory-only store with no durable sinks.
    pub fn new() -> Self {
        Self::with_sinks(Vec::new())
    }

    pub fn with_sinks(sinks: Vec<Box<dyn MetricSink>>) -> Self {
        Self {
            records: Vec::new(),
            sinks,
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn MetricSink>) {
        self.sinks.push(sink);
    }

    /// Append `record`, then fan it out to every sink.
    ///
    /// The record always lands in the in-memory log. Every sink is attempted
    /// even after one fails; the first failure is surfaced as
    /// [`MetricError::Persistence`].
    pub fn append(&mut self, record: EventRecord) -> Result<(), MetricError> {
        let mut first_failure = None;
        for sink in &self.sinks {
            if let Err(source) = sink.append(&record) {
                tracing::warn!(
                    target: "instrument",
                    %source,
                    path = ?sink.path(),
                    "metric sink rejected record"
                );
                if first_failure.is_none() {
                    first_failure = Some(MetricError::persistence(
                        sink.path().map(|p| p.to_path_buf()),
                        source,
                    ));
                }
            }
        }
        self.records.push(record);

        match first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// The full ordered sequence of accepted records.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flush every sink, surfacing the first failure.
    pub fn flush(&self) -> Result<(), MetricError> {
        for sink in &self.sinks {
            sink.flush()
                .map_err(|source| MetricError::persistence(sink.path().map(|p| p.to_path_buf()), source))?;
        }
        Ok(())
    }

    /// Flush and drop every sink. The in-memory log survives, so later
    /// appends remain visible to `records` even though nothing reaches disk.
    pub fn close(&mut self) -> Result<(), MetricError> {
        let result = self.flush();
        self.sinks.clear();
        result
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}
