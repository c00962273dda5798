//! Tests for progress reporting.

use medialib_core::ProgressReporter;
use std::sync::{Arc, Mutex};

fn recording() -> (ProgressReporter, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let reporter = ProgressReporter::new(Some(Arc::new(move |p: u8| sink.lock().unwrap().push(p))));
    (reporter, seen)
}

#[test]
fn test_sequence_is_non_decreasing() {
    let (reporter, seen) = recording();
    for p in [10, 70, 0, 50, 90, 100] {
        reporter.report(p);
    }
    let seen = seen.lock().unwrap();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*seen, vec![10, 70, 90, 100]);
}

#[test]
fn test_clamped_to_hundred() {
    let (reporter, seen) = recording();
    reporter.report(250);
    reporter.complete();
    assert_eq!(*seen.lock().unwrap(), vec![100]);
    assert_eq!(reporter.last_reported(), Some(100));
}

#[test]
fn test_zero_is_reported_first() {
    let (reporter, seen) = recording();
    assert_eq!(reporter.last_reported(), None);
    reporter.report(0);
    reporter.report(50);
    reporter.complete();
    assert_eq!(*seen.lock().unwrap(), vec![0, 50, 100]);
}

#[test]
fn test_silent_reporter_tracks_high_water() {
    let reporter = ProgressReporter::silent();
    reporter.report(40);
    reporter.report(20);
    assert_eq!(reporter.last_reported(), Some(40));
}

#[test]
fn test_clones_share_state() {
    let (reporter, seen) = recording();
    let other = reporter.clone();
    reporter.report(60);
    other.report(30);
    other.complete();
    assert_eq!(*seen.lock().unwrap(), vec![60, 100]);
}
