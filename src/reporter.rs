//! Read-only snapshot views over aggregator state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregator::{AggregateBucket, Aggregator};
use crate::event::EventKind;

/// Point-in-time, immutable statistics for one bucket (or a merged view
/// across every subject of a kind).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketSnapshot {
    pub count: u64,
    pub average_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub success_count: u64,
    pub error_count: u64,
    pub error_rate: f64,
}

impl From<&AggregateBucket> for BucketSnapshot {
    fn from(bucket: &AggregateBucket) -> Self {
        Self {
            count: bucket.count,
            average_duration: bucket.average_duration(),
            min_duration: bucket.min_duration,
            max_duration: bucket.max_duration,
            success_count: bucket.success_count,
            error_count: bucket.error_count,
            error_rate: bucket.error_rate(),
        }
    }
}

/// One bucket's snapshot together with its identity, for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct BucketSummary {
    pub kind: EventKind,
    pub subject: String,
    #[serde(flatten)]
    pub stats: BucketSnapshot,
}

/// Snapshot of every known bucket at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub generated_at: DateTime<Utc>,
    /// Ordered by kind, then subject.
    pub buckets: Vec<BucketSummary>,
}

impl PerformanceSummary {
    pub fn bucket(&self, kind: EventKind, subject: &str) -> Option<&BucketSummary> {
        self.buckets
            .iter()
            .find(|b| b.kind == kind && b.subject == subject)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Borrowing view that computes summaries from current aggregator state.
///
/// No side effects; safe to call at any point, including before the first
/// event (every query then yields a zero-valued snapshot).
pub struct Reporter<'a> {
    aggregator: &'a Aggregator,
}

impl<'a> Reporter<'a> {
    pub fn new(aggregator: &'a Aggregator) -> Self {
        Self { aggregator }
    }

    /// Snapshot for one bucket, or for the whole kind when `subject` is
    /// `None` (counts and durations summed, min of mins, max of maxs, so the
    /// average comes out weighted by count).
    pub fn summary(&self, kind: EventKind, subject: Option<&str>) -> BucketSnapshot {
        match subject {
            Some(subject) => self
                .aggregator
                .bucket(kind, subject)
                .map(BucketSnapshot::from)
                .unwrap_or_default(),
            None => {
                let mut merged = AggregateBucket::default();
                for (key, bucket) in self.aggregator.iter() {
                    if key.kind != kind {
                        continue;
                    }
                    if merged.count == 0 {
                        merged.min_duration = bucket.min_duration;
                        merged.max_duration = bucket.max_duration;
                    } else {
                        merged.min_duration = merged.min_duration.min(bucket.min_duration);
                        merged.max_duration = merged.max_duration.max(bucket.max_duration);
                    }
                    merged.count += bucket.count;
                    merged.sum_duration += bucket.sum_duration;
                    merged.success_count += bucket.success_count;
                    merged.error_count += bucket.error_count;
                }
                BucketSnapshot::from(&merged)
            }
        }
    }

    /// Snapshot of every known bucket, deterministically ordered.
    pub fn summary_all(&self, generated_at: DateTime<Utc>) -> PerformanceSummary {
        let mut buckets: Vec<BucketSummary> = self
            .aggregator
            .iter()
            .map(|(key, bucket)| BucketSummary {
                kind: key.kind,
                subject: key.subject.clone(),
                stats: BucketSnapshot::from(bucket),
            })
            .collect();
        buckets.sort_by(|a, b| (a.kind, &a.subject).cmp(&(b.kind, &b.subject)));
        PerformanceSummary { generated_at, buckets }
    }
}
