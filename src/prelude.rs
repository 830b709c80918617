//! Convenience re-exports for instrumentation consumers.

pub use crate::aggregator::{AggregateBucket, Aggregator, BucketKey};
pub use crate::collector::{AlreadyInstalled, Clock, PerformanceCollector, SystemClock, Timer};
pub use crate::config::{CollectorConfig, ConfigError};
pub use crate::error::MetricError;
pub use crate::event::{EventDetail, EventKind, EventRecord};
pub use crate::exporters::{ChannelSink, ConsoleSink, JsonlSink, MetricSink, NarrativeSink};
pub use crate::reporter::{BucketSnapshot, BucketSummary, PerformanceSummary, Reporter};
pub use crate::store::MetricStore;

pub use chrono::{DateTime, Utc};
pub use serde_json;
pub use tracing::{info, Level};
