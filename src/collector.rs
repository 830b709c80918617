//! Process-wide entry point instrumented call sites report through.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::aggregator::Aggregator;
use crate::config::CollectorConfig;
use crate::error::MetricError;
use crate::event::{EventKind, EventRecord};
use crate::exporters::{ConsoleSink, JsonlSink, MetricSink, NarrativeSink};
use crate::reporter::{BucketSnapshot, PerformanceSummary, Reporter};
use crate::store::MetricStore;

/// Wall-clock source, injectable for test isolation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock. Default for production collectors.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Interval helper for call sites that measure their own spans.
pub struct Timer {
    started: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

struct CollectorInner {
    store: MetricStore,
    aggregator: Aggregator,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Facade routing every event to the store and the aggregator.
///
/// All mutation happens under one lock, so concurrent call sites never lose
/// updates and summaries observe exact counts. A failing durable sink
/// surfaces [`MetricError::Persistence`] but the event is aggregated and
/// exported regardless; callers treat every error here as non-fatal for the
/// operation they were measuring.
pub struct PerformanceCollector {
    inner: Mutex<CollectorInner>,
    clock: Box<dyn Clock>,
}

static COLLECTOR: OnceLock<PerformanceCollector> = OnceLock::new();

/// The process-wide collector was already installed.
#[derive(Debug, thiserror::Error)]
#[error("performance collector already installed")]
pub struct AlreadyInstalled;

impl PerformanceCollector {
    /// Build a collector with the sinks named by `config` and the system
    /// clock. Opening a sink file may fail with [`MetricError::Persistence`].
    pub fn new(config: CollectorConfig) -> Result<Self, MetricError> {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// Build a collector with an injected clock source.
    pub fn with_clock(config: CollectorConfig, clock: Box<dyn Clock>) -> Result<Self, MetricError> {
        let mut sinks: Vec<Box<dyn MetricSink>> = Vec::new();
        if let Some(path) = &config.metrics_jsonl_path {
            let sink = JsonlSink::new(path)
                .map_err(|source| MetricError::persistence(Some(path.clone()), source))?;
            sinks.push(Box::new(sink));
        }
        if let Some(path) = &config.narrative_log_path {
            let sink = NarrativeSink::new(path)
                .map_err(|source| MetricError::persistence(Some(path.clone()), source))?;
            sinks.push(Box::new(sink));
        }
        if config.enable_console_metrics {
            sinks.push(Box::new(ConsoleSink::new()));
        }
        Ok(Self::from_parts(MetricStore::with_sinks(sinks), clock))
    }

    /// Build a collector over an explicit store, e.g. with custom sinks.
    pub fn from_parts(store: MetricStore, clock: Box<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(CollectorInner {
                store,
                aggregator: Aggregator::new(),
                last_timestamp: None,
            }),
            clock,
        }
    }

    /// Install `self` as the process-wide instance.
    pub fn install(self) -> Result<&'static Self, AlreadyInstalled> {
        COLLECTOR.set(self).map_err(|_| AlreadyInstalled)?;
        Ok(COLLECTOR.get().expect("collector just installed"))
    }

    /// The installed process-wide instance, if any.
    pub fn try_global() -> Option<&'static Self> {
        COLLECTOR.get()
    }

    /// The installed process-wide instance.
    ///
    /// Panics when no collector was installed; prefer [`Self::try_global`]
    /// outside of application wiring.
    pub fn global() -> &'static Self {
        COLLECTOR.get().expect("performance collector not installed")
    }

    pub fn log_model_loading(&self, model: &str, duration_seconds: f64, device: &str) -> Result<(), MetricError> {
        self.record(|timestamp| EventRecord::model_load(timestamp, model, duration_seconds, device))
    }

    pub fn log_inference_performance(
        &self,
        model: &str,
        duration_seconds: f64,
        input_len: u64,
        output_len: u64,
        chunk_id: Option<&str>,
    ) -> Result<(), MetricError> {
        self.record(|timestamp| {
            EventRecord::inference(timestamp, model, duration_seconds, input_len, output_len, chunk_id)
        })
    }

    pub fn log_preprocessing(
        &self,
        operation: &str,
        duration_seconds: f64,
        text_len: u64,
        chunk_count: u64,
    ) -> Result<(), MetricError> {
        self.record(|timestamp| {
            EventRecord::preprocessing(timestamp, operation, duration_seconds, text_len, chunk_count)
        })
    }

    pub fn log_total_processing(
        &self,
        duration_seconds: f64,
        chunk_count: u64,
        success_count: u64,
        error_count: u64,
    ) -> Result<(), MetricError> {
        self.record(|timestamp| {
            EventRecord::total_processing(timestamp, duration_seconds, chunk_count, success_count, error_count)
        })
    }

    pub fn log_memory_usage(&self, peak_mb: f64, current_mb: f64, model_mb: f64) -> Result<(), MetricError> {
        self.record(|timestamp| EventRecord::memory_usage(timestamp, peak_mb, current_mb, model_mb))
    }

    pub fn log_error(
        &self,
        context: &str,
        message: &str,
        metadata: BTreeMap<String, Value>,
    ) -> Result<(), MetricError> {
        self.record(|timestamp| EventRecord::error(timestamp, context, message, metadata))
    }

    /// Snapshot for one bucket, or merged across the kind's subjects.
    pub fn summary(&self, kind: EventKind, subject: Option<&str>) -> BucketSnapshot {
        let inner = self.inner.lock().expect("collector mutex poisoned");
        Reporter::new(&inner.aggregator).summary(kind, subject)
    }

    /// Snapshot of every known bucket.
    pub fn get_performance_summary(&self) -> PerformanceSummary {
        let generated_at = self.clock.now();
        let inner = self.inner.lock().expect("collector mutex poisoned");
        Reporter::new(&inner.aggregator).summary_all(generated_at)
    }

    /// The full ordered sequence of accepted records.
    ///
    /// Returns an owned snapshot taken under the lock; repeated calls are
    /// idempotent and never observe a partial append.
    pub fn export(&self) -> Vec<EventRecord> {
        let inner = self.inner.lock().expect("collector mutex poisoned");
        inner.store.records().to_vec()
    }

    /// Write every accepted record to `path` as a pretty-printed JSON array,
    /// for offline tooling.
    pub fn export_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), MetricError> {
        let path = path.as_ref();
        let records = self.export();
        let persistence = |source: io::Error| MetricError::persistence(Some(path.to_path_buf()), source);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(persistence)?;
            }
        }
        let file = std::fs::File::create(path).map_err(persistence)?;
        serde_json::to_writer_pretty(io::BufWriter::new(file), &records)
            .map_err(|source| persistence(io::Error::other(source)))?;
        tracing::info!(target: "metrics", "performance metrics saved to {}", path.display());
        Ok(())
    }

    pub fn event_count(&self) -> usize {
        let inner = self.inner.lock().expect("collector mutex poisoned");
        inner.store.len()
    }

    /// Clear every aggregate bucket. The store keeps its full history.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("collector mutex poisoned");
        inner.aggregator.reset();
    }

    /// Flush every durable sink.
    pub fn flush(&self) -> Result<(), MetricError> {
        let inner = self.inner.lock().expect("collector mutex poisoned");
        inner.store.flush()
    }

    /// Flush and detach every durable sink. Later events stay visible in the
    /// aggregates and `export`, but nothing further reaches disk.
    pub fn shutdown(&self) -> Result<(), MetricError> {
        let mut inner = self.inner.lock().expect("collector mutex poisoned");
        inner.store.close()
    }

    fn record<F>(&self, build: F) -> Result<(), MetricError>
    where
        F: FnOnce(DateTime<Utc>) -> Result<EventRecord, MetricError>,
    {
        let mut inner = self.inner.lock().expect("collector mutex poisoned");

        // Clamp so persisted timestamps stay non-decreasing even if the
        // clock steps backwards.
        let now = self.clock.now();
        let timestamp = match inner.last_timestamp {
            Some(last) if now < last => last,
            _ => now,
        };

        // Validation failures must leave every bucket untouched.
        let record = build(timestamp)?;

        inner.last_timestamp = Some(timestamp);
        inner.aggregator.update(&record);
        emit_narrative(&record);

        // The aggregates already saw the event; only the durable sinks can
        // still fail from here.
        inner.store.append(record)
    }
}

fn emit_narrative(record: &EventRecord) {
    if record.is_failure() {
        tracing::error!(target: "metrics", "{}", record.narrative());
    } else {
        tracing::info!(target: "metrics", "{}", record.narrative());
    }
}
