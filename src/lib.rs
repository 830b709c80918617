//! Performance metrics collection for the Folio summarization service.
//!
//! Instrumented call sites (model loader, inference routine, preprocessing
//! pipeline, request handler) report timed events through a
//! [`PerformanceCollector`]; the collector appends every record to an
//! ordered [`MetricStore`](store::MetricStore), folds it into per-bucket
//! running statistics, and serves point-in-time summaries and full exports
//! back to the application layer.

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod error;
pub mod event;
pub mod exporters;
pub mod logging;
pub mod macros;
pub mod prelude;
pub mod reporter;
pub mod store;

pub use collector::{Clock, PerformanceCollector, SystemClock, Timer};
pub use config::{CollectorConfig, ConfigError};
pub use error::MetricError;
pub use event::{EventDetail, EventKind, EventRecord};
pub use reporter::{BucketSnapshot, BucketSummary, PerformanceSummary};

#[cfg(test)]
mod tests;
