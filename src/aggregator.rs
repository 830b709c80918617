//! Running per-bucket statistics, updated in O(1) as events arrive.

use rustc_hash::FxHashMap;

use crate::event::{EventKind, EventRecord};

/// Identity of one aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub kind: EventKind,
    pub subject: String,
}

impl BucketKey {
    pub fn new(kind: EventKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
        }
    }
}

/// Running statistics for one `(kind, subject)` pair.
///
/// Purely derived state: replaying the store reproduces every bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateBucket {
    pub count: u64,
    pub sum_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub success_count: u64,
    pub error_count: u64,
}

impl AggregateBucket {
    /// Fold one observation in. Min and max are seeded from the first event.
    pub fn observe(&mut self, duration_seconds: f64, failed: bool) {
        if self.count == 0 {
            self.min_duration = duration_seconds;
            self.max_duration = duration_seconds;
        } else {
            self.min_duration = self.min_duration.min(duration_seconds);
            self.max_duration = self.max_duration.max(duration_seconds);
        }
        self.count += 1;
        self.sum_duration += duration_seconds;
        if failed {
            self.error_count += 1;
        } else {
            self.success_count += 1;
        }
    }

    /// Mean duration; 0 by convention for an empty bucket.
    pub fn average_duration(&self) -> f64 {
        if self.count > 0 {
            self.sum_duration / self.count as f64
        } else {
            0.0
        }
    }

    /// Failed fraction of outcomes; 0 by convention for an empty bucket.
    pub fn error_rate(&self) -> f64 {
        let total = self.success_count + self.error_count;
        if total > 0 {
            self.error_count as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Exclusive owner of every [`AggregateBucket`].
///
/// Buckets are created lazily on the first event for their key and live for
/// the process lifetime. Callers serialise access through the collector's
/// lock; nothing here locks on its own.
#[derive(Default)]
pub struct Aggregator {
    buckets: FxHashMap<BucketKey, AggregateBucket>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, record: &EventRecord) {
        let key = BucketKey::new(record.kind(), record.subject.clone());
        self.buckets
            .entry(key)
            .or_default()
            .observe(record.duration_seconds, record.is_failure());
    }

    /// Clear all buckets. The store is deliberately left untouched.
    pub fn reset(&mut self) {
        self.buckets.clear();
    }

    pub fn bucket(&self, kind: EventKind, subject: &str) -> Option<&AggregateBucket> {
        self.buckets.get(&BucketKey::new(kind, subject))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &AggregateBucket)> {
        self.buckets.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
