//! Error taxonomy for the metrics collection layer.

use std::io;
use std::path::PathBuf;

/// Errors surfaced to instrumented call sites.
///
/// The two variants are deliberately distinct: a [`MetricError::Validation`]
/// means the caller handed us malformed input and nothing was recorded, while
/// a [`MetricError::Persistence`] means the event is already visible in the
/// in-memory aggregates but a durable sink rejected it. Callers treat both as
/// non-fatal with respect to the operation being measured.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    /// A logging call carried structurally invalid input.
    #[error("invalid metric input: {reason}")]
    Validation { reason: String },
    /// A durable sink could not accept the record.
    #[error("failed to persist metric record{}: {source}", fmt_path(.path))]
    Persistence {
        /// Sink path, when the failing sink is file-backed.
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },
}

impl MetricError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    pub(crate) fn persistence(path: Option<PathBuf>, source: io::Error) -> Self {
        Self::Persistence { path, source }
    }

    /// True when the event still reached the in-memory aggregates.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" to {}", path.display()),
        None => String::new(),
    }
}
