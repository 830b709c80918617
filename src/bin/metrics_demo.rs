//! Minimal end-to-end exercise of the metrics collector.
//!
//! Simulates the call sites of the summarization service: one model load,
//! a preprocessing pass, a few chunk inferences, and the request total, then
//! prints the summary the web layer would render. Configure sinks through
//! the `FOLIO_*` environment variables.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use folio_instrumentation::prelude::*;
use folio_instrumentation::{logging, record_inference, record_model_load, record_total_processing};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CollectorConfig::from_env()?;
    logging::init(&config);

    let collector = PerformanceCollector::new(config)?.install()?;

    let load_timer = Timer::start();
    thread::sleep(Duration::from_millis(30));
    record_model_load!("t5-small", load_timer.elapsed_seconds(), "cpu");

    let text = "Artificial intelligence is transforming how books are read and summarized.";
    let prep_timer = Timer::start();
    let chunks = [&text[..40], &text[40..]];
    collector.log_preprocessing("chunking", prep_timer.elapsed_seconds(), text.len() as u64, chunks.len() as u64)?;

    let request_timer = Timer::start();
    for (index, chunk) in chunks.iter().enumerate() {
        let chunk_id = format!("chunk_{}", index + 1);
        let timer = Timer::start();
        thread::sleep(Duration::from_millis(10));
        record_inference!(
            "t5-small",
            timer.elapsed_seconds(),
            chunk.len() as u64,
            chunk.len() as u64 / 2,
            Some(chunk_id.as_str())
        );
    }
    record_total_processing!(request_timer.elapsed_seconds(), chunks.len() as u64, chunks.len() as u64, 0);

    collector.log_error(
        "DEMO",
        "simulated failure for the error path",
        BTreeMap::from([("severity".to_string(), serde_json::json!("low"))]),
    )?;

    let summary = collector.get_performance_summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    collector.shutdown()?;
    Ok(())
}
