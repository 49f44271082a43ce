//! Benchmark smoke tests for the timeline and session hot paths.

use std::sync::Arc;
use std::time::Instant;

use reclink_core::{RecordingStatus, SessionState, TimelinePoint, wire};
use reclink_gateway::SyntheticGateway;
use reclink_session::SessionReconciler;
use reclink_telemetry::TimelineAggregator;
use serde_json::json;

#[test]
fn benchmark_timeline_ingest_smoke_prints_latency() {
    let timeline = TimelineAggregator::new();
    timeline.on_recording_start();

    let start = Instant::now();
    let mut rendered = 0usize;

    // One hour of 10 Hz analytics, with a render snapshot every ten seconds.
    for tick in 0..36_000_u32 {
        let payload = json!({
            "time": f64::from(tick) / 10.0,
            "brightness": 0.5,
            "audioLevel": 0.1,
            "colorDominance": 0.3,
            "sceneChange": tick % 600 == 0,
        });
        let point: TimelinePoint =
            wire::decode_timeline_point(payload).expect("payload should decode");
        timeline.on_live_sample(point);
        if tick % 100 == 0 {
            rendered += timeline.snapshot().iter().filter(|p| p.scene_change).count();
        }
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_timeline_elapsed_ms={elapsed_ms}");
    println!("benchmark_timeline_rendered_markers={rendered}");

    assert_eq!(timeline.snapshot().len(), 36_000);
    // This is a lightweight guardrail; strict NFR checks are environment-specific.
    assert!(
        elapsed_ms < 5_000,
        "timeline ingest smoke benchmark should stay bounded"
    );
}

#[tokio::test]
async fn benchmark_authoritative_apply_smoke_prints_latency() {
    let reconciler = SessionReconciler::new(Arc::new(SyntheticGateway::new()));

    let start = Instant::now();
    for second in 0..10_000_u32 {
        reconciler
            .apply_authoritative(SessionState {
                status: RecordingStatus::Recording,
                elapsed_seconds: f64::from(second),
                last_output_path: None,
            })
            .await;
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_apply_elapsed_ms={elapsed_ms}");

    assert_eq!(reconciler.snapshot().elapsed_seconds, 9_999.0);
    assert!(
        elapsed_ms < 5_000,
        "authoritative apply smoke benchmark should stay bounded"
    );
}
