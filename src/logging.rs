//! Narrative log subscriber initialisation.

use tracing_subscriber::EnvFilter;

use crate::config::CollectorConfig;

/// Install a global `tracing` fmt subscriber honouring `RUST_LOG` overrides,
/// falling back to the configured level.
///
/// Safe to call more than once; repeated initialisation is ignored so test
/// binaries and embedding applications can both wire logging.
pub fn init(config: &CollectorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_ascii_lowercase()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
