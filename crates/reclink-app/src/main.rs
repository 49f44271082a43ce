#![warn(missing_docs)]
//! # reclink-app binary
//!
//! Drives a [`RecorderClient`] against the synthetic backend and prints what
//! the recorder shell would render.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reclink_app::{
    AppError, CaptureTarget, ClientConfig, RecorderClient, app_version, init_tracing,
};
use reclink_core::{MetricsSample, TimelinePoint};
use reclink_gateway::SyntheticGateway;
use reclink_session::SessionEvent;
use tracing::error;

const DEMO_SECONDS: u32 = 5;

/// CLI entry point.
#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(event = "demo_failed", error = %err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = ClientConfig::from_env()?;
    println!("reclink-app {}", app_version());
    println!(
        "push_events={} poll_interval_ms={}",
        config.push_enabled,
        config.poll_interval.as_millis()
    );

    let gateway = Arc::new(SyntheticGateway::new());
    let client = RecorderClient::connect(gateway.clone(), config).await;
    client.subscribe(|event| {
        if let SessionEvent::RecordingCompleted { output_path } = event {
            println!("recording saved to {output_path}");
        }
    });

    let devices = client.refresh_devices().await;
    for monitor in &devices.monitors {
        println!(
            "monitor {} {} ({}x{})",
            monitor.id, monitor.display_name, monitor.width_px, monitor.height_px
        );
    }
    for window in &devices.windows {
        println!("window {} {}", window.id, window.title);
    }
    let Some(monitor) = devices.monitors.first() else {
        println!("no monitor to record");
        client.shutdown().await;
        return Ok(());
    };

    client.start(CaptureTarget::Monitor(monitor.id.clone())).await?;

    let mut rng = StdRng::seed_from_u64(7);
    for second in 1..=DEMO_SECONDS {
        gateway.advance(1.0);
        gateway.emit_metrics(&MetricsSample {
            capture_fps: rng.random_range(28.0..30.0),
            encode_fps: rng.random_range(27.0..30.0),
            dropped_frames: u64::from(second / 2),
            encode_latency_ms: rng.random_range(8.0..16.0),
            cpu_percent: rng.random_range(20.0..45.0),
            memory_bytes: rng.random_range(300..400) * 1024 * 1024,
        });
        gateway.emit_analytics(TimelinePoint {
            time_seconds: f64::from(second),
            brightness: rng.random_range(0.0..1.0),
            audio_level: rng.random_range(0.0..1.0),
            color_dominance: rng.random_range(0.0..1.0),
            scene_change: rng.random_bool(0.2),
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let view = client.status_view();
        let labels = client.metrics_labels();
        println!(
            "{} {} | capture {} | encode {} | cpu {} | mem {}",
            view.indicator.as_deref().unwrap_or(""),
            view.timer,
            labels.capture_fps,
            labels.encode_latency,
            labels.cpu,
            labels.memory
        );
    }

    client.pause().await?;
    println!("pause button: {}", client.status_view().controls.pause_label);
    client.pause().await?;

    client.stop().await?;
    client.timeline_settled().await;

    let view = client.status_view();
    println!(
        "{} via {} | timeline points: {}",
        view.indicator.as_deref().unwrap_or("idle"),
        view.transport,
        client.timeline().len()
    );

    client.shutdown().await;
    Ok(())
}
