use std::collections::BTreeMap;
use std::io;
use std::sync::mpsc;
use std::thread;

use chrono::TimeZone;

use crate::prelude::*;

use super::{unique_temp_path, ManualClock};

fn in_memory_collector() -> PerformanceCollector {
    PerformanceCollector::from_parts(MetricStore::new(), Box::new(SystemClock))
}

struct FailingSink;

impl MetricSink for FailingSink {
    fn append(&self, _record: &EventRecord) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::NotConnected, "sink unavailable"))
    }
}

#[test]
fn model_loading_summary_matches_the_single_observation() {
    let collector = in_memory_collector();
    collector
        .log_model_loading("t5-small", 3.5869, "cpu")
        .expect("logging should succeed");

    let snapshot = collector.summary(EventKind::ModelLoad, Some("t5-small"));
    assert_eq!(snapshot.count, 1);
    assert_eq!(snapshot.average_duration, 3.5869);
    assert_eq!(snapshot.min_duration, 3.5869);
    assert_eq!(snapshot.max_duration, 3.5869);
    assert_eq!(snapshot.success_count, 1);
    assert_eq!(snapshot.error_count, 0);
}

#[test]
fn repeated_inference_calls_average_to_the_mean() {
    let collector = in_memory_collector();
    let durations = [0.5, 1.5, 2.0, 4.0];
    for duration in durations {
        collector
            .log_inference_performance("t5-small", duration, 120, 60, Some("chunk_1"))
            .expect("logging should succeed");
    }

    let snapshot = collector.summary(EventKind::Inference, Some("chunk_1"));
    assert_eq!(snapshot.count, durations.len() as u64);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    assert!((snapshot.average_duration - mean).abs() < 1e-12);
    assert_eq!(snapshot.min_duration, 0.5);
    assert_eq!(snapshot.max_duration, 4.0);
}

#[test]
fn request_scenario_counts_one_total_with_zero_error_rate() {
    let collector = in_memory_collector();
    collector
        .log_inference_performance("t5-small", 1.9426, 54, 54, Some("chunk_1"))
        .expect("logging should succeed");
    collector
        .log_total_processing(3.0424, 2, 2, 0)
        .expect("logging should succeed");

    let snapshot = collector.summary(EventKind::TotalProcessing, None);
    assert_eq!(snapshot.count, 1);

    let records = collector.export();
    match &records[1].detail {
        EventDetail::TotalProcessing { error_rate, .. } => assert_eq!(*error_rate, 0.0),
        other => panic!("expected total processing detail, got {other:?}"),
    }
}

#[test]
fn validation_failure_touches_no_state() {
    let collector = in_memory_collector();
    match collector.log_inference_performance("t5-small", -1.0, 10, 10, Some("chunk_1")) {
        Err(MetricError::Validation { .. }) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    assert_eq!(collector.event_count(), 0);
    assert!(collector.get_performance_summary().is_empty());
    assert_eq!(
        collector.summary(EventKind::Inference, Some("chunk_1")),
        BucketSnapshot::default()
    );
}

#[test]
fn summary_before_any_event_is_zero_valued() {
    let collector = in_memory_collector();
    let summary = collector.get_performance_summary();
    assert!(summary.is_empty());
    assert_eq!(
        collector.summary(EventKind::ModelLoad, None),
        BucketSnapshot::default()
    );
}

#[test]
fn export_is_ordered_and_idempotent() {
    let collector = in_memory_collector();
    for index in 0..5u64 {
        let chunk_id = format!("chunk_{index}");
        collector
            .log_inference_performance("t5-small", index as f64, 10, 10, Some(chunk_id.as_str()))
            .expect("logging should succeed");
    }

    let first = collector.export();
    let second = collector.export();
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    for (index, record) in first.iter().enumerate() {
        assert_eq!(record.subject, format!("chunk_{index}"));
    }
    let again: Vec<String> = second.iter().map(|r| r.subject.clone()).collect();
    assert_eq!(again, first.iter().map(|r| r.subject.clone()).collect::<Vec<_>>());
}

#[test]
fn concurrent_logging_loses_no_updates() {
    let collector = in_memory_collector();
    let threads: u64 = 8;
    let events_per_thread: u64 = 50;

    thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|| {
                for _ in 0..events_per_thread {
                    collector
                        .log_inference_performance("t5-small", 0.01, 10, 10, Some("shared"))
                        .expect("logging should succeed");
                }
            });
        }
    });

    let snapshot = collector.summary(EventKind::Inference, Some("shared"));
    assert_eq!(snapshot.count, threads * events_per_thread);
    assert_eq!(collector.event_count(), (threads * events_per_thread) as usize);
}

#[test]
fn persistence_failure_still_aggregates_and_exports() {
    let store = MetricStore::with_sinks(vec![Box::new(FailingSink)]);
    let collector = PerformanceCollector::from_parts(store, Box::new(SystemClock));

    match collector.log_model_loading("t5-small", 1.0, "cpu") {
        Err(error @ MetricError::Persistence { .. }) => assert!(error.is_persistence()),
        other => panic!("expected persistence error, got {other:?}"),
    }

    let snapshot = collector.summary(EventKind::ModelLoad, Some("t5-small"));
    assert_eq!(snapshot.count, 1);
    assert_eq!(collector.export().len(), 1);
}

#[test]
fn reset_clears_aggregates_but_keeps_the_store() {
    let collector = in_memory_collector();
    collector
        .log_model_loading("t5-small", 1.0, "cpu")
        .expect("logging should succeed");

    collector.reset();
    assert!(collector.get_performance_summary().is_empty());
    assert_eq!(collector.export().len(), 1);
}

#[test]
fn timestamps_never_regress_when_the_clock_steps_backwards() {
    let clock = ManualClock::at(Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 10).single().expect("valid time"));
    let collector =
        PerformanceCollector::from_parts(MetricStore::new(), Box::new(clock.clone()));

    collector
        .log_model_loading("t5-small", 1.0, "cpu")
        .expect("logging should succeed");
    clock.set(Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 5).single().expect("valid time"));
    collector
        .log_inference_performance("t5-small", 1.0, 10, 10, None)
        .expect("logging should succeed");

    let records = collector.export();
    assert_eq!(records.len(), 2);
    assert!(records[1].timestamp >= records[0].timestamp);
}

#[test]
fn export_to_path_writes_the_full_history_as_json() {
    let path = unique_temp_path("folio_export_test", "json");
    let collector = in_memory_collector();
    collector
        .log_model_loading("t5-small", 1.0, "cpu")
        .expect("logging should succeed");
    collector
        .log_memory_usage(512.0, 420.5, 230.0)
        .expect("logging should succeed");

    collector.export_to_path(&path).expect("export should write file");
    let contents = std::fs::read_to_string(&path).expect("export file should exist");
    let records: Vec<EventRecord> = serde_json::from_str(&contents).expect("export should parse");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind(), EventKind::ModelLoad);
    assert_eq!(records[1].kind(), EventKind::MemoryUsage);

    std::fs::remove_file(&path).expect("temporary export file should be removable");
}

#[test]
fn configured_sinks_receive_every_record_end_to_end() {
    let jsonl_path = unique_temp_path("folio_collector_jsonl", "jsonl");
    let narrative_path = unique_temp_path("folio_collector_narrative", "log");
    let config = CollectorConfig::default()
        .with_jsonl_path(&jsonl_path)
        .with_narrative_path(&narrative_path);

    let collector = PerformanceCollector::new(config).expect("collector should open sinks");
    collector
        .log_model_loading("t5-small", 3.5869, "cpu")
        .expect("logging should succeed");
    collector
        .log_preprocessing("chunking", 0.25, 1000, 4)
        .expect("logging should succeed");
    collector.shutdown().expect("shutdown should flush");

    let jsonl = std::fs::read_to_string(&jsonl_path).expect("jsonl file should exist");
    assert_eq!(jsonl.lines().count(), 2);
    let first: EventRecord = serde_json::from_str(jsonl.lines().next().expect("first line"))
        .expect("jsonl line should parse");
    assert_eq!(first.kind(), EventKind::ModelLoad);

    let narrative = std::fs::read_to_string(&narrative_path).expect("narrative file should exist");
    assert!(narrative.contains("Preprocessing 'chunking' completed"));

    std::fs::remove_file(&jsonl_path).expect("temporary jsonl file should be removable");
    std::fs::remove_file(&narrative_path).expect("temporary narrative file should be removable");
}

#[test]
fn memory_usage_events_aggregate_like_any_other_kind() {
    let collector = in_memory_collector();
    collector
        .log_memory_usage(512.0, 420.5, 230.0)
        .expect("logging should succeed");

    let summary = collector.get_performance_summary();
    let bucket = summary
        .bucket(EventKind::MemoryUsage, "")
        .expect("memory bucket should exist");
    assert_eq!(bucket.stats.count, 1);
}

#[test]
fn error_events_raise_the_error_rate_of_their_context() {
    let collector = in_memory_collector();
    for _ in 0..2 {
        collector
            .log_error("summarize", "model timeout", BTreeMap::new())
            .expect("logging should succeed");
    }

    let snapshot = collector.summary(EventKind::Error, Some("summarize"));
    assert_eq!(snapshot.count, 2);
    assert_eq!(snapshot.error_count, 2);
    assert_eq!(snapshot.error_rate, 1.0);
}

#[test]
fn installed_global_collector_routes_macro_call_sites() {
    let (sender, receiver) = mpsc::channel();
    let store = MetricStore::with_sinks(vec![Box::new(ChannelSink::new(sender))]);
    let collector = PerformanceCollector::from_parts(store, Box::new(SystemClock));

    let installed = collector.install().expect("first install should succeed");
    assert!(std::ptr::eq(
        installed,
        PerformanceCollector::global()
    ));

    crate::record_model_load!("t5-small", 3.5869, "cpu");
    crate::record_inference!("t5-small", 1.9426, 54, 54, Some("chunk_1"));
    crate::record_total_processing!(3.0424, 2, 2, 0);
    crate::record_collector_error!("summarize", "model timeout");

    let mut kinds = Vec::new();
    for _ in 0..4 {
        kinds.push(receiver.recv().expect("record should arrive").kind());
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::ModelLoad,
            EventKind::Inference,
            EventKind::TotalProcessing,
            EventKind::Error,
        ]
    );

    let another = in_memory_collector();
    assert!(another.install().is_err(), "second install must be rejected");
}
