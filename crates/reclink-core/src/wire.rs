//! Backend wire payloads and their mapping into the model.
//!
//! The backend names fields differently from the model (`is_recording`,
//! `encode_latency`, `audioLevel`, ...). Mapping is a rename only. Absent or
//! `null` fields decode to zero values, never to an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    MetricsSample, Monitor, RecordingStatus, SessionState, TimelinePoint, WindowHandle, non_empty,
};

/// Session payload carried by `session-update` events and status queries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPayload {
    /// Whether a session is open.
    #[serde(deserialize_with = "null_as_default")]
    pub is_recording: bool,
    /// Whether the open session is paused.
    #[serde(deserialize_with = "null_as_default")]
    pub is_paused: bool,
    /// Recorded seconds excluding pauses.
    #[serde(deserialize_with = "null_as_default")]
    pub duration: f64,
    /// Output file written by the backend once stopped.
    #[serde(deserialize_with = "null_as_default")]
    pub output_path: String,
}

impl From<SessionPayload> for SessionState {
    fn from(payload: SessionPayload) -> Self {
        let status = match (payload.is_recording, payload.is_paused) {
            (true, true) => RecordingStatus::Paused,
            (true, false) => RecordingStatus::Recording,
            (false, _) => RecordingStatus::Idle,
        };

        Self {
            status,
            elapsed_seconds: non_negative(payload.duration),
            last_output_path: non_empty(payload.output_path),
        }
    }
}

/// Metrics payload carried by `metrics-update` events.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsPayload {
    /// Frames captured per second.
    #[serde(deserialize_with = "null_as_default")]
    pub capture_fps: f64,
    /// Frames encoded per second.
    #[serde(deserialize_with = "null_as_default")]
    pub encode_fps: f64,
    /// Dropped frame counter.
    #[serde(deserialize_with = "count")]
    pub dropped_frames: u64,
    /// Average encode latency in milliseconds.
    #[serde(deserialize_with = "null_as_default")]
    pub encode_latency: f64,
    /// Process CPU usage percentage.
    #[serde(deserialize_with = "null_as_default")]
    pub cpu_usage: f64,
    /// Process memory in bytes.
    #[serde(deserialize_with = "count")]
    pub memory_usage: u64,
}

impl From<MetricsPayload> for MetricsSample {
    fn from(payload: MetricsPayload) -> Self {
        Self {
            capture_fps: non_negative(payload.capture_fps),
            encode_fps: non_negative(payload.encode_fps),
            dropped_frames: payload.dropped_frames,
            encode_latency_ms: non_negative(payload.encode_latency),
            cpu_percent: payload.cpu_usage,
            memory_bytes: payload.memory_usage,
        }
    }
}

/// Timeline point as persisted and emitted by the analytics pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelinePayload {
    /// Offset from session start in seconds.
    #[serde(alias = "time_seconds", deserialize_with = "null_as_default")]
    pub time: f64,
    /// Average luminance.
    #[serde(deserialize_with = "null_as_default")]
    pub brightness: f64,
    /// Audio activity level.
    #[serde(alias = "audio_level", deserialize_with = "null_as_default")]
    pub audio_level: f64,
    /// Dominant luminance share.
    #[serde(alias = "color_dominance", deserialize_with = "null_as_default")]
    pub color_dominance: f64,
    /// Scene boundary flag.
    #[serde(alias = "scene_change", deserialize_with = "null_as_default")]
    pub scene_change: bool,
}

impl From<TimelinePayload> for TimelinePoint {
    fn from(payload: TimelinePayload) -> Self {
        Self {
            time_seconds: non_negative(payload.time),
            brightness: payload.brightness,
            audio_level: payload.audio_level,
            color_dominance: payload.color_dominance,
            scene_change: payload.scene_change,
        }
    }
}

impl From<&TimelinePoint> for TimelinePayload {
    fn from(point: &TimelinePoint) -> Self {
        Self {
            time: point.time_seconds,
            brightness: point.brightness,
            audio_level: point.audio_level,
            color_dominance: point.color_dominance,
            scene_change: point.scene_change,
        }
    }
}

/// Monitor entry returned by `list_monitors`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorPayload {
    /// Backend id. Numeric ids are accepted and stringified.
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    /// Monitor name.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Width in pixels.
    #[serde(deserialize_with = "null_as_default")]
    pub width: u32,
    /// Height in pixels.
    #[serde(deserialize_with = "null_as_default")]
    pub height: u32,
}

impl From<MonitorPayload> for Monitor {
    fn from(payload: MonitorPayload) -> Self {
        Self {
            id: payload.id,
            display_name: payload.name,
            width_px: payload.width,
            height_px: payload.height,
        }
    }
}

/// Window entry returned by `list_windows`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowPayload {
    /// Backend id. Numeric ids are accepted and stringified.
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    /// Window title.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

impl From<WindowPayload> for WindowHandle {
    fn from(payload: WindowPayload) -> Self {
        Self {
            id: payload.id,
            title: payload.title,
        }
    }
}

/// Decodes a session payload.
///
/// # Errors
/// Returns [`WireError::Decode`] when the value is not an object or a field
/// has an incompatible type.
pub fn decode_session(value: Value) -> Result<SessionState, WireError> {
    decode::<SessionPayload>("session", value).map(SessionState::from)
}

/// Decodes a metrics payload.
///
/// # Errors
/// Returns [`WireError::Decode`] on incompatible shapes.
pub fn decode_metrics(value: Value) -> Result<MetricsSample, WireError> {
    decode::<MetricsPayload>("metrics", value).map(MetricsSample::from)
}

/// Decodes one timeline point.
///
/// # Errors
/// Returns [`WireError::Decode`] on incompatible shapes.
pub fn decode_timeline_point(value: Value) -> Result<TimelinePoint, WireError> {
    decode::<TimelinePayload>("timeline point", value).map(TimelinePoint::from)
}

/// Decodes a full timeline list.
///
/// # Errors
/// Returns [`WireError::Decode`] when any entry is malformed; a persisted
/// timeline is replaced wholesale, so partial decoding is not attempted.
pub fn decode_timeline(values: Vec<Value>) -> Result<Vec<TimelinePoint>, WireError> {
    values.into_iter().map(decode_timeline_point).collect()
}

/// Decodes a monitor list.
///
/// # Errors
/// Returns [`WireError::Decode`] when any entry is malformed.
pub fn decode_monitors(values: Vec<Value>) -> Result<Vec<Monitor>, WireError> {
    values
        .into_iter()
        .map(|value| decode::<MonitorPayload>("monitor", value).map(Monitor::from))
        .collect()
}

/// Decodes a window list.
///
/// # Errors
/// Returns [`WireError::Decode`] when any entry is malformed.
pub fn decode_windows(values: Vec<Value>) -> Result<Vec<WindowHandle>, WireError> {
    values
        .into_iter()
        .map(|value| decode::<WindowPayload>("window", value).map(WindowHandle::from))
        .collect()
}

fn decode<T>(kind: &'static str, value: Value) -> Result<T, WireError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(value).map_err(|source| WireError::Decode { kind, source })
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountRepr {
    Whole(u64),
    Fractional(f64),
}

// Counters occasionally arrive as floats from JavaScript-facing bridges.
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<CountRepr>::deserialize(deserializer)? {
        Some(CountRepr::Whole(value)) => value,
        Some(CountRepr::Fractional(value)) if value.is_finite() && value > 0.0 => value as u64,
        Some(CountRepr::Fractional(_)) | None => 0,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(serde_json::Number),
}

fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IdRepr>::deserialize(deserializer)? {
        Some(IdRepr::Text(text)) => text,
        Some(IdRepr::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

/// Wire decoding errors.
#[derive(Debug, Error)]
pub enum WireError {
    /// Payload shape does not match the expected record.
    #[error("malformed {kind} payload: {source}")]
    Decode {
        /// Record kind being decoded.
        kind: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
