//! Validates backend payload fixtures against frozen JSON schemas, and checks
//! that the client decodes them and the synthetic backend emits them.

use jsonschema::JSONSchema;
use reclink_core::sidecar::TimelineSidecar;
use reclink_core::wire;
use reclink_core::{MetricsSample, RecordingStatus, TimelinePoint};
use reclink_gateway::{BackendGateway, EventChannel, SyntheticGateway};
use serde_json::{Value, json};

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

fn contract(name: &str) -> (JSONSchema, Value) {
    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts");
    let validator = compile_validator(&format!("{root}/{name}.schema.json"));
    let fixture = load_json(&format!("{root}/fixtures/{name}.valid.json"));
    (validator, fixture)
}

#[test]
fn session_fixture_matches_schema_and_decodes() {
    let (validator, fixture) = contract("session-update");
    assert!(
        validator.is_valid(&fixture),
        "session fixture should validate against schema"
    );

    let state = wire::decode_session(fixture).expect("session fixture should decode");
    assert_eq!(state.status, RecordingStatus::Idle);
    assert_eq!(
        state.last_output_path.as_deref(),
        Some("/home/user/Videos/recording_20240101_120000.mkv")
    );
}

#[test]
fn session_schema_rejects_stringly_typed_flags() {
    let (validator, _) = contract("session-update");
    let payload = json!({ "is_recording": "yes", "is_paused": false, "duration": 1.0 });
    assert!(!validator.is_valid(&payload));
}

#[test]
fn metrics_fixture_matches_schema_and_decodes() {
    let (validator, fixture) = contract("metrics-update");
    assert!(
        validator.is_valid(&fixture),
        "metrics fixture should validate against schema"
    );

    let sample = wire::decode_metrics(fixture).expect("metrics fixture should decode");
    assert_eq!(sample.dropped_frames, 3);
    assert_eq!(sample.memory_bytes, 536_870_912);
}

#[test]
fn analytics_fixture_matches_schema_and_decodes() {
    let (validator, fixture) = contract("analytics-update");
    assert!(
        validator.is_valid(&fixture),
        "analytics fixture should validate against schema"
    );

    let point = wire::decode_timeline_point(fixture).expect("analytics fixture should decode");
    assert_eq!(point.time_seconds, 12.5);
    assert!(point.scene_change);
}

#[test]
fn sidecar_fixture_matches_schema_and_loads() {
    let (validator, fixture) = contract("timeline-sidecar");
    assert!(
        validator.is_valid(&fixture),
        "sidecar fixture should validate against schema"
    );

    let raw = serde_json::to_vec(&fixture).expect("fixture should serialize");
    let sidecar = TimelineSidecar::from_json_bytes(&raw).expect("sidecar should parse");
    let times: Vec<f64> = sidecar.points().iter().map(|p| p.time_seconds).collect();
    assert_eq!(times, vec![0.0, 0.5, 1.0]);
}

#[tokio::test]
async fn synthetic_backend_emits_contract_payloads() {
    let (session_schema, _) = contract("session-update");
    let (metrics_schema, _) = contract("metrics-update");
    let (analytics_schema, _) = contract("analytics-update");

    let gateway = SyntheticGateway::new();
    let mut metrics = gateway
        .subscribe(EventChannel::MetricsUpdate)
        .await
        .expect("subscribe metrics");
    let mut analytics = gateway
        .subscribe(EventChannel::AnalyticsUpdate)
        .await
        .expect("subscribe analytics");

    gateway
        .start(Some("monitor-1"), None)
        .await
        .expect("start");
    gateway.emit_metrics(&MetricsSample {
        capture_fps: 30.0,
        dropped_frames: 1,
        memory_bytes: 1024,
        ..MetricsSample::default()
    });
    gateway.emit_analytics(TimelinePoint {
        time_seconds: 1.0,
        ..TimelinePoint::default()
    });

    let status = gateway.get_status().await.expect("status");
    assert!(session_schema.is_valid(&status));
    assert!(metrics_schema.is_valid(&metrics.recv().await.expect("metrics payload")));
    assert!(analytics_schema.is_valid(&analytics.recv().await.expect("analytics payload")));

    gateway.stop().await.expect("stop");
    let stopped = gateway.get_status().await.expect("status");
    assert!(session_schema.is_valid(&stopped));
    assert!(stopped["output_path"].is_string());
}
