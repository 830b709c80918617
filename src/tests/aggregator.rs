use crate::prelude::*;

#[test]
fn first_observation_seeds_min_and_max() {
    let mut bucket = AggregateBucket::default();
    bucket.observe(2.5, false);

    assert_eq!(bucket.count, 1);
    assert_eq!(bucket.min_duration, 2.5);
    assert_eq!(bucket.max_duration, 2.5);
    assert_eq!(bucket.average_duration(), 2.5);
}

#[test]
fn observations_fold_in_constant_time_state() {
    let mut bucket = AggregateBucket::default();
    for duration in [3.0, 1.0, 2.0] {
        bucket.observe(duration, false);
    }

    assert_eq!(bucket.count, 3);
    assert_eq!(bucket.min_duration, 1.0);
    assert_eq!(bucket.max_duration, 3.0);
    assert!((bucket.average_duration() - 2.0).abs() < 1e-12);
    assert_eq!(bucket.success_count, 3);
    assert_eq!(bucket.error_count, 0);
}

#[test]
fn error_rate_is_exact_for_eight_successes_two_failures() {
    let mut bucket = AggregateBucket::default();
    for _ in 0..8 {
        bucket.observe(0.1, false);
    }
    for _ in 0..2 {
        bucket.observe(0.1, true);
    }

    assert_eq!(bucket.success_count, 8);
    assert_eq!(bucket.error_count, 2);
    assert_eq!(bucket.error_rate(), 0.2);
}

#[test]
fn empty_bucket_derives_zeros_by_convention() {
    let bucket = AggregateBucket::default();
    assert_eq!(bucket.average_duration(), 0.0);
    assert_eq!(bucket.error_rate(), 0.0);
}

#[test]
fn buckets_are_keyed_by_kind_and_subject() {
    let mut aggregator = Aggregator::new();
    let load = EventRecord::model_load(Utc::now(), "t5-small", 3.0, "cpu").expect("record should build");
    let other = EventRecord::model_load(Utc::now(), "t5-base", 9.0, "cpu").expect("record should build");
    aggregator.update(&load);
    aggregator.update(&other);

    let small = aggregator
        .bucket(EventKind::ModelLoad, "t5-small")
        .expect("bucket should exist");
    assert_eq!(small.count, 1);
    assert_eq!(small.sum_duration, 3.0);
    assert!(aggregator.bucket(EventKind::Inference, "t5-small").is_none());
}

#[test]
fn reset_clears_every_bucket() {
    let mut aggregator = Aggregator::new();
    let record = EventRecord::model_load(Utc::now(), "t5-small", 3.0, "cpu").expect("record should build");
    aggregator.update(&record);
    assert!(!aggregator.is_empty());

    aggregator.reset();
    assert!(aggregator.is_empty());
    assert!(aggregator.bucket(EventKind::ModelLoad, "t5-small").is_none());
}
