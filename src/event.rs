//! Canonical event definitions for the performance metrics layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MetricError;

/// The closed set of event kinds the collector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    ModelLoad,
    Inference,
    Preprocessing,
    TotalProcessing,
    MemoryUsage,
    Error,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ModelLoad => "ModelLoad",
            Self::Inference => "Inference",
            Self::Preprocessing => "Preprocessing",
            Self::TotalProcessing => "TotalProcessing",
            Self::MemoryUsage => "MemoryUsage",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Kind-specific payload carried by every [`EventRecord`].
///
/// Derived figures the original call sites stuffed into loose metadata
/// (throughput, error rate) live here as typed fields instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventDetail {
    /// A model checkpoint finished loading.
    ModelLoad {
        /// Device the weights were placed on (e.g. "cpu", "cuda").
        device: String,
    },
    /// One inference call over a single chunk of text.
    Inference {
        model: String,
        /// Input length in characters.
        input_size: u64,
        /// Output length in characters.
        output_size: u64,
        /// Input characters per second; 0 when the duration is 0.
        throughput: f64,
    },
    /// One preprocessing pass (chunking, cleaning, segmentation).
    Preprocessing {
        input_size: u64,
        chunk_count: u64,
        throughput: f64,
    },
    /// End-to-end figures for a whole summarization request.
    TotalProcessing {
        chunk_count: u64,
        success_count: u64,
        error_count: u64,
        /// Failed fraction of chunks, in `[0, 1]`.
        error_rate: f64,
    },
    /// Point-in-time process memory statistics.
    MemoryUsage { peak_mb: f64, current_mb: f64, model_mb: f64 },
    /// A failure reported by an instrumented call site.
    Error { message: String },
}

impl EventDetail {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ModelLoad { .. } => EventKind::ModelLoad,
            Self::Inference { .. } => EventKind::Inference,
            Self::Preprocessing { .. } => EventKind::Preprocessing,
            Self::TotalProcessing { .. } => EventKind::TotalProcessing,
            Self::MemoryUsage { .. } => EventKind::MemoryUsage,
            Self::Error { .. } => EventKind::Error,
        }
    }
}

/// One timed occurrence reported to the collector.
///
/// Records are immutable once built: the store only ever appends them and the
/// aggregator reads them. Construction goes through the per-kind functions
/// below so that validation and timestamping stay centralised in the facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Wall-clock stamp assigned by the collector, monotonic per process.
    pub timestamp: DateTime<Utc>,
    /// Grouping key within the kind: model id, chunk id, operation name.
    /// May be empty.
    pub subject: String,
    pub duration_seconds: f64,
    #[serde(flatten)]
    pub detail: EventDetail,
    /// Residual free-form context (error metadata, app-specific tags).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl EventRecord {
    pub(crate) fn model_load(
        timestamp: DateTime<Utc>,
        model: &str,
        duration_seconds: f64,
        device: &str,
    ) -> Result<Self, MetricError> {
        validate_duration(duration_seconds)?;
        Ok(Self {
            timestamp,
            subject: model.to_string(),
            duration_seconds,
            detail: EventDetail::ModelLoad { device: device.to_string() },
            extra: BTreeMap::new(),
        })
    }

    pub(crate) fn inference(
        timestamp: DateTime<Utc>,
        model: &str,
        duration_seconds: f64,
        input_size: u64,
        output_size: u64,
        chunk_id: Option<&str>,
    ) -> Result<Self, MetricError> {
        validate_duration(duration_seconds)?;
        Ok(Self {
            timestamp,
            subject: chunk_id.unwrap_or_default().to_string(),
            duration_seconds,
            detail: EventDetail::Inference {
                model: model.to_string(),
                input_size,
                output_size,
                throughput: throughput(input_size, duration_seconds),
            },
            extra: BTreeMap::new(),
        })
    }

    pub(crate) fn preprocessing(
        timestamp: DateTime<Utc>,
        operation: &str,
        duration_seconds: f64,
        input_size: u64,
        chunk_count: u64,
    ) -> Result<Self, MetricError> {
        validate_duration(duration_seconds)?;
        Ok(Self {
            timestamp,
            subject: operation.to_string(),
            duration_seconds,
            detail: EventDetail::Preprocessing {
                input_size,
                chunk_count,
                throughput: throughput(input_size, duration_seconds),
            },
            extra: BTreeMap::new(),
        })
    }

    pub(crate) fn total_processing(
        timestamp: DateTime<Utc>,
        duration_seconds: f64,
        chunk_count: u64,
        success_count: u64,
        error_count: u64,
    ) -> Result<Self, MetricError> {
        validate_duration(duration_seconds)?;
        let error_rate = if chunk_count > 0 {
            error_count as f64 / chunk_count as f64
        } else {
            0.0
        };
        Ok(Self {
            timestamp,
            subject: String::new(),
            duration_seconds,
            detail: EventDetail::TotalProcessing {
                chunk_count,
                success_count,
                error_count,
                error_rate,
            },
            extra: BTreeMap::new(),
        })
    }

    pub(crate) fn memory_usage(
        timestamp: DateTime<Utc>,
        peak_mb: f64,
        current_mb: f64,
        model_mb: f64,
    ) -> Result<Self, MetricError> {
        Ok(Self {
            timestamp,
            subject: String::new(),
            duration_seconds: 0.0,
            detail: EventDetail::MemoryUsage {
                peak_mb,
                current_mb,
                model_mb,
            },
            extra: BTreeMap::new(),
        })
    }

    pub(crate) fn error(
        timestamp: DateTime<Utc>,
        context: &str,
        message: &str,
        metadata: BTreeMap<String, Value>,
    ) -> Result<Self, MetricError> {
        Ok(Self {
            timestamp,
            subject: context.to_string(),
            duration_seconds: 0.0,
            detail: EventDetail::Error { message: message.to_string() },
            extra: metadata,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.detail.kind()
    }

    /// True when this event counts as a failure in the aggregates: either an
    /// `Error` event, or any event whose `extra` carries `"failed": true`.
    pub fn is_failure(&self) -> bool {
        if self.kind() == EventKind::Error {
            return true;
        }
        matches!(self.extra.get("failed"), Some(Value::Bool(true)))
    }

    /// One human-readable line for the narrative log.
    ///
    /// Field presence is stable; exact formatting is not a contract.
    pub fn narrative(&self) -> String {
        match &self.detail {
            EventDetail::ModelLoad { device } => format!(
                "Model '{}' loaded on {} in {:.4} seconds",
                self.subject, device, self.duration_seconds
            ),
            EventDetail::Inference {
                model,
                input_size,
                output_size,
                throughput,
            } => {
                let chunk_info = if self.subject.is_empty() {
                    String::new()
                } else {
                    format!(" (Chunk: {})", self.subject)
                };
                format!(
                    "Inference completed{} - Model: {}, Time: {:.4}s, Input: {} chars, Output: {} chars, Throughput: {:.2} chars/s",
                    chunk_info, model, self.duration_seconds, input_size, output_size, throughput
                )
            }
            EventDetail::Preprocessing {
                input_size,
                chunk_count,
                throughput,
            } => format!(
                "Preprocessing '{}' completed - Text: {} chars, Time: {:.4}s, Chunks: {}, Throughput: {:.2} chars/s",
                self.subject, input_size, self.duration_seconds, chunk_count, throughput
            ),
            EventDetail::TotalProcessing {
                chunk_count,
                success_count,
                error_count,
                error_rate,
            } => {
                let avg = if *chunk_count > 0 {
                    self.duration_seconds / *chunk_count as f64
                } else {
                    0.0
                };
                format!(
                    "Total processing completed - Time: {:.4}s, Chunks: {}, Success: {}, Errors: {} ({:.1}%), Avg time per chunk: {:.4}s",
                    self.duration_seconds,
                    chunk_count,
                    success_count,
                    error_count,
                    error_rate * 100.0,
                    avg
                )
            }
            EventDetail::MemoryUsage {
                peak_mb,
                current_mb,
                model_mb,
            } => format!(
                "Memory usage - Peak: {:.2} MB, Current: {:.2} MB, Model: {:.2} MB",
                peak_mb, current_mb, model_mb
            ),
            EventDetail::Error { message } => {
                if self.extra.is_empty() {
                    format!("ERROR [{}]: {}", self.subject, message)
                } else {
                    let context = serde_json::to_string(&self.extra).unwrap_or_default();
                    format!("ERROR [{}]: {} | Context: {}", self.subject, message, context)
                }
            }
        }
    }
}

fn validate_duration(duration_seconds: f64) -> Result<(), MetricError> {
    if !duration_seconds.is_finite() {
        return Err(MetricError::validation(format!(
            "duration_seconds must be finite, got {duration_seconds}"
        )));
    }
    if duration_seconds < 0.0 {
        return Err(MetricError::validation(format!(
            "duration_seconds must be non-negative, got {duration_seconds}"
        )));
    }
    Ok(())
}

fn throughput(input_size: u64, duration_seconds: f64) -> f64 {
    if duration_seconds > 0.0 {
        input_size as f64 / duration_seconds
    } else {
        0.0
    }
}
