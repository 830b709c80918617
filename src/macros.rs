//! Call-site macros routed at the installed process-wide collector.
//!
//! Each macro forwards to [`PerformanceCollector::try_global`] and, when no
//! collector is installed, falls back to a plain `tracing` event so tests and
//! lightweight setups continue to observe metrics. Persistence failures are
//! logged and swallowed: a lost metric must never abort the operation that
//! was being measured.

#[doc(hidden)]
pub fn report_record_failure(error: &crate::error::MetricError) {
    tracing::warn!(target: "instrument", %error, "failed to record metric");
}

/// Record a model-load timing against the global collector.
#[macro_export]
macro_rules! record_model_load {
    ($model:expr, $duration_seconds:expr, $device:expr) => {{
        match $crate::PerformanceCollector::try_global() {
            Some(collector) => {
                if let Err(error) = collector.log_model_loading($model, $duration_seconds, $device) {
                    $crate::macros::report_record_failure(&error);
                }
            }
            None => tracing::info!(
                target: "metrics",
                "Model '{}' loaded on {} in {:.4} seconds",
                $model,
                $device,
                $duration_seconds
            ),
        }
    }};
}

/// Record one inference call against the global collector.
#[macro_export]
macro_rules! record_inference {
    ($model:expr, $duration_seconds:expr, $input_len:expr, $output_len:expr, $chunk_id:expr) => {{
        match $crate::PerformanceCollector::try_global() {
            Some(collector) => {
                if let Err(error) =
                    collector.log_inference_performance($model, $duration_seconds, $input_len, $output_len, $chunk_id)
                {
                    $crate::macros::report_record_failure(&error);
                }
            }
            None => tracing::info!(
                target: "metrics",
                "Inference completed - Model: {}, Time: {:.4}s, Input: {} chars, Output: {} chars",
                $model,
                $duration_seconds,
                $input_len,
                $output_len
            ),
        }
    }};
}

/// Record one preprocessing pass against the global collector.
#[macro_export]
macro_rules! record_preprocessing {
    ($operation:expr, $duration_seconds:expr, $text_len:expr, $chunk_count:expr) => {{
        match $crate::PerformanceCollector::try_global() {
            Some(collector) => {
                if let Err(error) = collector.log_preprocessing($operation, $duration_seconds, $text_len, $chunk_count) {
                    $crate::macros::report_record_failure(&error);
                }
            }
            None => tracing::info!(
                target: "metrics",
                "Preprocessing '{}' completed - Text: {} chars, Time: {:.4}s, Chunks: {}",
                $operation,
                $text_len,
                $duration_seconds,
                $chunk_count
            ),
        }
    }};
}

/// Record end-to-end request figures against the global collector.
#[macro_export]
macro_rules! record_total_processing {
    ($duration_seconds:expr, $chunk_count:expr, $success_count:expr, $error_count:expr) => {{
        match $crate::PerformanceCollector::try_global() {
            Some(collector) => {
                if let Err(error) =
                    collector.log_total_processing($duration_seconds, $chunk_count, $success_count, $error_count)
                {
                    $crate::macros::report_record_failure(&error);
                }
            }
            None => tracing::info!(
                target: "metrics",
                "Total processing completed - Time: {:.4}s, Chunks: {}, Success: {}, Errors: {}",
                $duration_seconds,
                $chunk_count,
                $success_count,
                $error_count
            ),
        }
    }};
}

/// Record a failure against the global collector.
#[macro_export]
macro_rules! record_collector_error {
    ($context:expr, $message:expr) => {
        $crate::record_collector_error!($context, $message, std::collections::BTreeMap::new())
    };
    ($context:expr, $message:expr, $metadata:expr) => {{
        match $crate::PerformanceCollector::try_global() {
            Some(collector) => {
                if let Err(error) = collector.log_error($context, $message, $metadata) {
                    $crate::macros::report_record_failure(&error);
                }
            }
            None => tracing::error!(target: "metrics", "ERROR [{}]: {}", $context, $message),
        }
    }};
}
