//! 进度聚合：并发累加下回调值单调、终值等于总大小，并同步到响应式状态。

use std::sync::Arc;

use crate::download::{DownloadStatus, InFlightState, ProgressEvent, ProgressTracker};
use crate::states::unlock_reactive::UnlockReactiveProperty;
use crate::tests::EventLog;

#[test]
fn new_tracker_seeds_state_with_resumed_bytes() {
    let state = UnlockReactiveProperty::new(InFlightState::default());
    let tracker = ProgressTracker::new("sha256:aa", 100, 40, None, state.clone());

    assert_eq!(tracker.completed(), 40);
    let current = state.get_current().unwrap();
    assert_eq!((current.completed, current.total), (40, 100));
    assert_eq!(current.status, DownloadStatus::Running);
}

#[test]
fn add_is_clamped_to_total() {
    let log = EventLog::default();
    let state = UnlockReactiveProperty::new(InFlightState::default());
    let tracker = ProgressTracker::new("sha256:aa", 10, 0, Some(log.callback()), state);

    assert_eq!(tracker.add(6), 6);
    assert_eq!(tracker.add(6), 10);
    assert_eq!(tracker.add(0), 10);
    assert_eq!(log.completed_values(), vec![6, 10]);
}

#[test]
fn events_carry_status_and_digest() {
    let log = EventLog::default();
    let state = UnlockReactiveProperty::new(InFlightState::default());
    let tracker = ProgressTracker::new("sha256:aa", 4, 0, Some(log.callback()), state);
    tracker.report();
    tracker.finish();

    let events = log.events();
    assert_eq!(events[0], ProgressEvent::downloading("sha256:aa", 0, 4));
    assert_eq!(events[0].status, "downloading sha256:aa");
    assert_eq!(events[1].completed, 4);
    assert_eq!(events[1].pct(), 100.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_report_monotonic_progress() {
    let log = EventLog::default();
    let state = UnlockReactiveProperty::new(InFlightState::default());
    let tracker = Arc::new(ProgressTracker::new(
        "sha256:aa",
        8 * 1000,
        0,
        Some(log.callback()),
        state.clone(),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            for _ in 0..1000 {
                tracker.add(1);
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let values = log.completed_values();
    assert_eq!(values.len(), 8000);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values.last(), Some(&8000));
    assert_eq!(state.get_current().unwrap().completed, 8000);
}

#[test]
fn pct_of_empty_blob_is_complete() {
    assert_eq!(ProgressEvent::downloading("sha256:aa", 0, 0).pct(), 100.0);
    assert_eq!(ProgressEvent::downloading("sha256:aa", 1, 4).pct(), 25.0);
}
