//! Collector configuration, loadable from the process environment.

use std::env;
use std::path::PathBuf;

use tracing::Level;

/// Errors that can occur while loading a [`CollectorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A provided log level could not be parsed.
    #[error("invalid log level '{value}'")]
    InvalidLogLevel { value: String },
    /// A provided boolean flag could not be parsed.
    #[error("invalid boolean flag '{value}' for {name}")]
    InvalidBoolean { name: &'static str, value: String },
}

/// Configuration for one [`PerformanceCollector`](crate::PerformanceCollector).
///
/// Every field has a usable default; `from_env` overlays the `FOLIO_*`
/// environment variables on top of those defaults.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// The minimum tracing level for narrative application logs.
    pub log_level: Level,
    /// Optional path for persisting records as JSON lines.
    pub metrics_jsonl_path: Option<PathBuf>,
    /// Optional path for the human-readable narrative log.
    pub narrative_log_path: Option<PathBuf>,
    /// Whether records should also be echoed to stdout.
    pub enable_console_metrics: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            metrics_jsonl_path: None,
            narrative_log_path: None,
            enable_console_metrics: false,
        }
    }
}

impl CollectorConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_level = match env::var("FOLIO_LOG_LEVEL") {
            Ok(value) => parse_level(&value)?,
            Err(_) => Level::INFO,
        };

        let metrics_jsonl_path = env::var("FOLIO_METRICS_JSONL_PATH").ok().map(PathBuf::from);
        let narrative_log_path = env::var("FOLIO_NARRATIVE_LOG_PATH").ok().map(PathBuf::from);

        let enable_console_metrics = match env::var("FOLIO_METRICS_CONSOLE") {
            Ok(value) => parse_bool("FOLIO_METRICS_CONSOLE", &value)?,
            Err(_) => false,
        };

        Ok(Self {
            log_level,
            metrics_jsonl_path,
            narrative_log_path,
            enable_console_metrics,
        })
    }

    pub fn with_jsonl_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_jsonl_path = Some(path.into());
        self
    }

    pub fn with_narrative_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.narrative_log_path = Some(path.into());
        self
    }

    pub fn with_console_metrics(mut self, enabled: bool) -> Self {
        self.enable_console_metrics = enabled;
        self
    }
}

fn parse_level(value: &str) -> Result<Level, ConfigError> {
    value
        .parse::<Level>()
        .map_err(|_| ConfigError::InvalidLogLevel { value: value.to_string() })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            name,
            value: value.to_string(),
        }),
    }
}
