//! Integration tests for timeline accumulation and settlement.

mod common;

use std::sync::Arc;

use common::TimelineGateway;
use reclink_core::TimelinePoint;
use reclink_telemetry::{TimelineAggregator, TimelinePhase, TimelineSettle};

fn point(time_seconds: f64) -> TimelinePoint {
    TimelinePoint {
        time_seconds,
        brightness: 0.1,
        ..TimelinePoint::default()
    }
}

fn times(timeline: &TimelineAggregator) -> Vec<f64> {
    timeline
        .snapshot()
        .iter()
        .map(|point| point.time_seconds)
        .collect()
}

#[tokio::test]
async fn timeline_tests_session_end_replaces_live_points_wholesale() {
    let timeline = TimelineAggregator::new();
    timeline.on_recording_start();
    for second in 1..=5 {
        timeline.on_live_sample(point(f64::from(second)));
    }
    assert_eq!(times(&timeline), vec![1.0, 2.0, 3.0, 4.0, 5.0]);

    let gateway = TimelineGateway::serving(&[0.0, 2.5, 5.0, 7.5]);
    let settle = timeline.on_session_ended(&gateway).await;

    assert!(matches!(settle, TimelineSettle::Replaced { points: 4 }));
    assert_eq!(times(&timeline), vec![0.0, 2.5, 5.0, 7.5]);
    assert_eq!(timeline.snapshot().get(1).expect("second point").brightness, 0.5);
}

#[tokio::test]
async fn timeline_tests_failed_fetch_keeps_live_points() {
    let timeline = TimelineAggregator::new();
    timeline.on_recording_start();
    timeline.on_live_sample(point(1.0));
    timeline.on_live_sample(point(2.0));

    let settle = timeline
        .on_session_ended(&TimelineGateway::failing("timeline unavailable"))
        .await;

    assert!(matches!(settle, TimelineSettle::Kept(_)));
    assert_eq!(times(&timeline), vec![1.0, 2.0]);
}

#[tokio::test]
async fn timeline_tests_samples_after_session_end_are_ignored() {
    let timeline = TimelineAggregator::new();
    timeline.on_recording_start();
    timeline.on_live_sample(point(1.0));

    let _ = timeline
        .on_session_ended(&TimelineGateway::serving(&[1.0]))
        .await;
    timeline.on_live_sample(point(2.0));

    assert_eq!(timeline.phase(), TimelinePhase::Settled);
    assert_eq!(times(&timeline), vec![1.0]);
}

#[tokio::test]
async fn timeline_tests_fetch_resolving_after_new_start_is_discarded() {
    let timeline = Arc::new(TimelineAggregator::new());
    let gateway = Arc::new(TimelineGateway::serving(&[1.0, 2.0, 3.0]).gated());
    timeline.on_recording_start();
    timeline.on_live_sample(point(1.0));

    let settling = {
        let timeline = timeline.clone();
        let gateway = gateway.clone();
        tokio::spawn(async move { timeline.on_session_ended(gateway.as_ref()).await })
    };
    gateway.fetch_entered.notified().await;

    timeline.on_recording_start();
    timeline.on_live_sample(point(0.5));
    if let Some(release) = &gateway.release_fetch {
        release.notify_one();
    }

    let settle = settling.await.expect("join");
    assert!(matches!(settle, TimelineSettle::Superseded));
    assert_eq!(times(&timeline), vec![0.5]);
    assert_eq!(timeline.phase(), TimelinePhase::Live);
}

#[tokio::test]
async fn timeline_tests_restart_before_fetch_runs_keeps_new_session_live() {
    let timeline = TimelineAggregator::new();
    timeline.on_recording_start();
    timeline.on_live_sample(point(1.0));

    let generation = timeline.begin_settle();
    timeline.on_recording_start();
    for second in 1..=3 {
        timeline.on_live_sample(point(f64::from(second)));
    }
    let settle = timeline
        .finish_settle(generation, &TimelineGateway::serving(&[7.0, 8.0]))
        .await;
    timeline.on_live_sample(point(4.0));

    assert!(matches!(settle, TimelineSettle::Superseded));
    assert_eq!(timeline.phase(), TimelinePhase::Live);
    assert_eq!(times(&timeline), vec![1.0, 2.0, 3.0, 4.0]);
}

#[tokio::test]
async fn timeline_tests_live_refresh_replaces_running_session_only() {
    let timeline = TimelineAggregator::new();
    timeline.on_recording_start();
    timeline.on_live_sample(point(1.0));
    let generation = timeline.live_generation().expect("session running");

    assert!(timeline.refresh_live(generation, vec![point(0.5), point(1.0), point(1.5)]));
    assert_eq!(times(&timeline), vec![0.5, 1.0, 1.5]);
    assert_eq!(timeline.phase(), TimelinePhase::Live);

    let _ = timeline
        .on_session_ended(&TimelineGateway::serving(&[2.0]))
        .await;
    assert!(!timeline.refresh_live(generation, vec![point(9.0)]));
    assert_eq!(times(&timeline), vec![2.0]);
}
