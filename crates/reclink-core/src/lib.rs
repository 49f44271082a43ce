#![warn(missing_docs)]
//! # reclink-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `reclink` workspace.
//!
//! ## Responsibilities
//! - Represent the client-side view of a recording session ([`SessionState`]).
//! - Represent the two telemetry streams ([`MetricsSample`], [`TimelinePoint`]).
//! - Represent capture targets offered by the backend ([`DeviceDescriptor`]).
//! - Decode backend wire payloads into the model ([`wire`]).
//! - Read persisted analytics sidecars written next to finished recordings
//!   ([`sidecar`]).
//!
//! ## Data flow
//! Backend JSON payload -> [`wire`] decoder -> model value -> reconciler or
//! telemetry buffer -> read-only snapshot for presentation.
//!
//! ## Ownership and lifetimes
//! All model values own their strings so snapshots can outlive the buffers
//! they were copied from.
//!
//! ## Error model
//! Only decoding can fail; failures surface as [`WireError`]. Absent wire
//! fields are never errors, they decode to zero values.
//!
//! ## Example
//! ```rust
//! use reclink_core::{RecordingStatus, SessionState};
//!
//! let state = SessionState::recording_started();
//! assert_eq!(state.status, RecordingStatus::Recording);
//! assert_eq!(state.elapsed_seconds, 0.0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod sidecar;
pub mod wire;

pub use wire::WireError;

/// Lifecycle status of the remote recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    /// No recording in progress.
    #[default]
    Idle,
    /// Frames are being captured and encoded.
    Recording,
    /// Session is open but capture is suspended.
    Paused,
}

impl RecordingStatus {
    /// Returns `true` for `Recording` and `Paused`.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    /// Stable lowercase label used in logs and status text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Client-side copy of the recording session lifecycle.
///
/// # Invariants
/// - `Paused` is only reachable after a `Recording` transition.
/// - `elapsed_seconds` is non-negative, non-decreasing while the session is
///   active, and resets to zero on `Idle -> Recording`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Current lifecycle status.
    pub status: RecordingStatus,
    /// Recorded time in seconds, excluding paused spans.
    pub elapsed_seconds: f64,
    /// Location of the most recently finished recording, if any.
    pub last_output_path: Option<String>,
}

impl SessionState {
    /// Idle session with no elapsed time and no output.
    pub fn idle() -> Self {
        Self::default()
    }

    /// State guessed locally right after a successful start command.
    pub fn recording_started() -> Self {
        Self {
            status: RecordingStatus::Recording,
            elapsed_seconds: 0.0,
            last_output_path: None,
        }
    }

    /// State confirmed by a successful stop command.
    ///
    /// An empty path is normalized to `None`.
    pub fn stopped(output_path: impl Into<String>) -> Self {
        Self {
            status: RecordingStatus::Idle,
            elapsed_seconds: 0.0,
            last_output_path: non_empty(output_path.into()),
        }
    }

    /// Returns the output path when moving from `previous` to `self` finishes
    /// a recording.
    ///
    /// A transition is terminal when `previous` was active, `self` is `Idle`
    /// and the update names a non-empty output location.
    pub fn completed_output(&self, previous: RecordingStatus) -> Option<&str> {
        if !previous.is_active() || self.status != RecordingStatus::Idle {
            return None;
        }

        self.last_output_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
    }
}

/// Latest performance gauge reported by the backend encoder.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSample {
    /// Frames captured per second.
    pub capture_fps: f64,
    /// Frames encoded per second.
    pub encode_fps: f64,
    /// Frames dropped since the session started.
    pub dropped_frames: u64,
    /// Average encode latency in milliseconds.
    pub encode_latency_ms: f64,
    /// Process CPU usage. Usually within 0..=100 but not enforced.
    pub cpu_percent: f64,
    /// Process resident memory in bytes.
    pub memory_bytes: u64,
}

/// One analytics sample on the recording timeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// Offset from session start in seconds.
    pub time_seconds: f64,
    /// Average frame luminance.
    pub brightness: f64,
    /// Audio activity level.
    pub audio_level: f64,
    /// Share of the dominant luminance bucket.
    pub color_dominance: f64,
    /// Whether this sample starts a new scene.
    pub scene_change: bool,
}

/// A monitor the backend can capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Backend identifier. Not guaranteed stable across refreshes.
    pub id: String,
    /// Human-readable monitor name.
    pub display_name: String,
    /// Native width in pixels.
    pub width_px: u32,
    /// Native height in pixels.
    pub height_px: u32,
}

/// A top-level window the backend can capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowHandle {
    /// Backend identifier. Not guaranteed stable across refreshes.
    pub id: String,
    /// Window title.
    pub title: String,
}

/// Capture target offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceDescriptor {
    /// Whole-monitor capture.
    Monitor(Monitor),
    /// Single-window capture.
    Window(WindowHandle),
}

impl DeviceDescriptor {
    /// Backend identifier of the target.
    pub fn id(&self) -> &str {
        match self {
            Self::Monitor(monitor) => &monitor.id,
            Self::Window(window) => &window.id,
        }
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session state helpers.

    use super::*;

    #[test]
    fn completed_output_requires_active_to_idle_with_path() {
        let stopped = SessionState::stopped("/videos/a.mkv");
        assert_eq!(
            stopped.completed_output(RecordingStatus::Recording),
            Some("/videos/a.mkv")
        );
        assert_eq!(
            stopped.completed_output(RecordingStatus::Paused),
            Some("/videos/a.mkv")
        );
        assert_eq!(stopped.completed_output(RecordingStatus::Idle), None);

        let no_path = SessionState::stopped("");
        assert_eq!(no_path.last_output_path, None);
        assert_eq!(no_path.completed_output(RecordingStatus::Recording), None);
    }

    #[test]
    fn status_labels_are_lowercase() {
        assert_eq!(RecordingStatus::Paused.to_string(), "paused");
        assert!(RecordingStatus::Paused.is_active());
        assert!(!RecordingStatus::Idle.is_active());
    }
}
