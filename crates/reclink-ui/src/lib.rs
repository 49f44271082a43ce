#![warn(missing_docs)]
//! # reclink-ui
//!
//! ## Purpose
//! Projects session and metrics snapshots into display-ready text and control
//! states for the recorder shell.
//!
//! ## Responsibilities
//! - Format the elapsed timer as `HH:MM:SS`.
//! - Pick the status indicator and control enablement for a session state.
//! - Format metrics labels with fixed precision.
//!
//! ## Data flow
//! `SessionState` / `MetricsSample` snapshot -> [`StatusView::project`] /
//! [`MetricsLabels::project`] -> rendered by the shell.
//!
//! ## Ownership and lifetimes
//! Views own their strings so the shell can keep them across redraws without
//! borrowing client state.
//!
//! ## Error model
//! Pure functions; out-of-range inputs are clamped instead of rejected.

use reclink_core::{MetricsSample, RecordingStatus, SessionState};

/// Indicator shown while recording.
pub const INDICATOR_RECORDING: &str = "● REC";
/// Indicator shown while paused.
pub const INDICATOR_PAUSED: &str = "⏸ PAUSED";
/// Indicator shown before the first recording.
pub const INDICATOR_READY: &str = "Ready to record";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Formats seconds as zero-padded `HH:MM:SS`.
///
/// Fractions are floored; negative and non-finite inputs show `00:00:00`.
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Indicator text for a session, if one applies.
pub fn status_indicator(state: &SessionState) -> Option<&'static str> {
    match state.status {
        RecordingStatus::Recording => Some(INDICATOR_RECORDING),
        RecordingStatus::Paused => Some(INDICATOR_PAUSED),
        RecordingStatus::Idle if state.elapsed_seconds == 0.0 => Some(INDICATOR_READY),
        RecordingStatus::Idle => None,
    }
}

/// Enablement of the recorder controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsState {
    /// Start accepts input.
    pub start_enabled: bool,
    /// Pause/resume accepts input.
    pub pause_enabled: bool,
    /// Stop accepts input.
    pub stop_enabled: bool,
    /// Caption of the pause/resume button.
    pub pause_label: &'static str,
}

impl ControlsState {
    /// Controls for `status`.
    pub fn for_status(status: RecordingStatus) -> Self {
        Self {
            start_enabled: status == RecordingStatus::Idle,
            pause_enabled: status.is_active(),
            stop_enabled: status.is_active(),
            pause_label: if status == RecordingStatus::Paused {
                "▶ Resume"
            } else {
                "⏸ Pause"
            },
        }
    }
}

/// Flat status snapshot for the recorder shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    /// App version string.
    pub version: String,
    /// Status indicator, if any.
    pub indicator: Option<String>,
    /// Elapsed timer text.
    pub timer: String,
    /// Control enablement.
    pub controls: ControlsState,
    /// How session updates arrive (`live` or `polling`).
    pub transport: String,
    /// Last finished recording.
    pub last_output: Option<String>,
}

impl StatusView {
    /// Projects a session snapshot.
    pub fn project(
        state: &SessionState,
        transport: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            indicator: status_indicator(state).map(str::to_string),
            timer: format_elapsed(state.elapsed_seconds),
            controls: ControlsState::for_status(state.status),
            transport: transport.into(),
            last_output: state.last_output_path.clone(),
        }
    }
}

/// Metrics panel text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsLabels {
    /// Capture rate, e.g. `29.9 fps`.
    pub capture_fps: String,
    /// Encode rate.
    pub encode_fps: String,
    /// Dropped frame count.
    pub dropped_frames: String,
    /// Encode latency, e.g. `12.3 ms`.
    pub encode_latency: String,
    /// CPU share, e.g. `37.5%`.
    pub cpu: String,
    /// Resident memory, e.g. `512.0 MB`.
    pub memory: String,
}

impl MetricsLabels {
    /// Formats one sample.
    pub fn project(sample: &MetricsSample) -> Self {
        Self {
            capture_fps: format!("{:.1} fps", sample.capture_fps),
            encode_fps: format!("{:.1} fps", sample.encode_fps),
            dropped_frames: sample.dropped_frames.to_string(),
            encode_latency: format!("{:.1} ms", sample.encode_latency_ms),
            cpu: format!("{:.1}%", sample.cpu_percent),
            memory: format_memory_mb(sample.memory_bytes),
        }
    }
}

/// Formats bytes as megabytes with one decimal.
pub fn format_memory_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / BYTES_PER_MB)
}
