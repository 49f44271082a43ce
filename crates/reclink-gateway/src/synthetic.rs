//! Deterministic in-memory backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use reclink_core::wire::{MonitorPayload, TimelinePayload, WindowPayload};
use reclink_core::{MetricsSample, Monitor, RecordingStatus, TimelinePoint, WindowHandle};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::{BackendGateway, EventChannel, GatewayError, Subscription};

/// In-memory backend that follows the real backend's command semantics.
///
/// Session changes caused by commands are pushed to subscribers the same way
/// the real backend emits them. Tests drive time and telemetry through
/// [`SyntheticGateway::advance`], [`SyntheticGateway::emit_metrics`] and
/// [`SyntheticGateway::emit_analytics`].
#[derive(Debug, Clone)]
pub struct SyntheticGateway {
    inner: Arc<Mutex<SyntheticState>>,
    status_calls: Arc<AtomicUsize>,
    start_calls: Arc<AtomicUsize>,
    timeline_calls: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct SyntheticState {
    status: RecordingStatus,
    elapsed_seconds: f64,
    last_output: Option<String>,
    recordings: u64,
    output_dir: String,
    timeline: Vec<TimelinePoint>,
    monitors: Vec<Monitor>,
    windows: Vec<WindowHandle>,
    monitor_failure: Option<String>,
    window_failure: Option<String>,
    unsupported_reason: Option<String>,
    refused_channels: HashSet<EventChannel>,
    listeners: HashMap<EventChannel, Vec<Listener>>,
    next_listener_id: u64,
}

#[derive(Debug)]
struct Listener {
    id: u64,
    sender: mpsc::UnboundedSender<Value>,
}

impl SyntheticGateway {
    /// Creates a backend with one monitor and one window.
    pub fn new() -> Self {
        Self::with_devices(
            vec![Monitor {
                id: "monitor-1".to_string(),
                display_name: "Synthetic Display".to_string(),
                width_px: 1920,
                height_px: 1080,
            }],
            vec![WindowHandle {
                id: "window-1".to_string(),
                title: "Synthetic Window".to_string(),
            }],
        )
    }

    /// Creates a backend with caller-provided capture targets.
    pub fn with_devices(monitors: Vec<Monitor>, windows: Vec<WindowHandle>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SyntheticState {
                status: RecordingStatus::Idle,
                elapsed_seconds: 0.0,
                last_output: None,
                recordings: 0,
                output_dir: "/recordings".to_string(),
                timeline: Vec::new(),
                monitors,
                windows,
                monitor_failure: None,
                window_failure: None,
                unsupported_reason: None,
                refused_channels: HashSet::new(),
                listeners: HashMap::new(),
                next_listener_id: 0,
            })),
            status_calls: Arc::new(AtomicUsize::new(0)),
            start_calls: Arc::new(AtomicUsize::new(0)),
            timeline_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes subscriptions to `channel` fail.
    pub fn refuse_channel(self, channel: EventChannel) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.refused_channels.insert(channel);
        }
        self
    }

    /// Makes `list_monitors` fail with `message`.
    pub fn fail_monitor_listing(self, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.monitor_failure = Some(message.into());
        }
        self
    }

    /// Makes `list_windows` fail with `message`.
    pub fn fail_window_listing(self, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.window_failure = Some(message.into());
        }
        self
    }

    /// Makes every start command fail as an unsupported platform would.
    pub fn unsupported_platform(self) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.unsupported_reason =
                Some("Screen capture not implemented for this platform".to_string());
        }
        self
    }

    /// Sets the directory used for generated output paths.
    pub fn with_output_dir(self, dir: impl Into<String>) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.output_dir = dir.into();
        }
        self
    }

    /// Number of `get_status` calls served so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Number of `start` calls received so far.
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_timeline` calls served so far.
    pub fn timeline_calls(&self) -> usize {
        self.timeline_calls.load(Ordering::SeqCst)
    }

    /// Number of live listeners on `channel`.
    pub fn listener_count(&self, channel: EventChannel) -> usize {
        self.state()
            .map(|state| {
                state
                    .listeners
                    .get(&channel)
                    .map(|listeners| {
                        listeners
                            .iter()
                            .filter(|listener| !listener.sender.is_closed())
                            .count()
                    })
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Current backend status.
    pub fn status(&self) -> RecordingStatus {
        self.state()
            .map(|state| state.status)
            .unwrap_or(RecordingStatus::Idle)
    }

    /// Advances recorded time while recording and pushes a session update.
    pub fn advance(&self, seconds: f64) {
        if let Ok(mut state) = self.state() {
            if state.status == RecordingStatus::Recording {
                state.elapsed_seconds += seconds.max(0.0);
            }
            let payload = state.session_payload(false);
            state.broadcast(EventChannel::SessionUpdate, payload);
        }
    }

    /// Pushes a metrics sample to subscribers.
    pub fn emit_metrics(&self, sample: &MetricsSample) {
        let payload = json!({
            "capture_fps": sample.capture_fps,
            "encode_fps": sample.encode_fps,
            "dropped_frames": sample.dropped_frames,
            "encode_latency": sample.encode_latency_ms,
            "cpu_usage": sample.cpu_percent,
            "memory_usage": sample.memory_bytes,
        });
        if let Ok(mut state) = self.state() {
            state.broadcast(EventChannel::MetricsUpdate, payload);
        }
    }

    /// Records an analytics point in the persisted timeline and pushes it to
    /// subscribers. Ignored unless recording.
    pub fn emit_analytics(&self, point: TimelinePoint) {
        if let Ok(mut state) = self.state() {
            if state.status != RecordingStatus::Recording {
                return;
            }
            state.timeline.push(point);
            let payload = timeline_value(&point);
            state.broadcast(EventChannel::AnalyticsUpdate, payload);
        }
    }

    /// Pushes an arbitrary payload on `channel`.
    pub fn emit_raw(&self, channel: EventChannel, payload: Value) {
        if let Ok(mut state) = self.state() {
            state.broadcast(channel, payload);
        }
    }

    /// Replaces the persisted timeline returned by `get_timeline`.
    pub fn set_persisted_timeline(&self, points: Vec<TimelinePoint>) {
        if let Ok(mut state) = self.state() {
            state.timeline = points;
        }
    }

    /// Detaches every listener, as a backend restart would.
    pub fn close_channels(&self) {
        if let Ok(mut state) = self.state() {
            state.listeners.clear();
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, SyntheticState>, GatewayError> {
        self.inner
            .lock()
            .map_err(|_| GatewayError::Unreachable("synthetic state lock poisoned".to_string()))
    }
}

impl Default for SyntheticGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticState {
    fn session_payload(&self, include_output: bool) -> Value {
        let mut payload = json!({
            "is_recording": self.status.is_active(),
            "is_paused": self.status == RecordingStatus::Paused,
            "duration": self.elapsed_seconds,
        });
        if (include_output || self.status == RecordingStatus::Idle)
            && let Some(path) = &self.last_output
        {
            payload["output_path"] = Value::String(path.clone());
        }
        payload
    }

    fn broadcast(&mut self, channel: EventChannel, payload: Value) {
        if let Some(listeners) = self.listeners.get_mut(&channel) {
            listeners.retain(|listener| listener.sender.send(payload.clone()).is_ok());
        }
    }
}

#[async_trait]
impl BackendGateway for SyntheticGateway {
    async fn start(
        &self,
        monitor_id: Option<&str>,
        window_id: Option<&str>,
    ) -> Result<(), GatewayError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;

        if state.status.is_active() {
            return Err(GatewayError::Command(
                "Recording already in progress".to_string(),
            ));
        }
        if let Some(reason) = &state.unsupported_reason {
            return Err(GatewayError::Command(reason.clone()));
        }

        let known = match (monitor_id, window_id) {
            (Some(id), _) => state.monitors.iter().any(|monitor| monitor.id == id),
            (None, Some(id)) => state.windows.iter().any(|window| window.id == id),
            (None, None) => {
                return Err(GatewayError::Command(
                    "No capture source specified".to_string(),
                ));
            }
        };
        if !known {
            return Err(GatewayError::Command(format!(
                "Failed to create capture source: unknown target {}",
                monitor_id.or(window_id).unwrap_or_default()
            )));
        }

        state.recordings += 1;
        state.status = RecordingStatus::Recording;
        state.elapsed_seconds = 0.0;
        state.last_output = None;
        state.timeline.clear();
        let payload = state.session_payload(false);
        state.broadcast(EventChannel::SessionUpdate, payload);
        Ok(())
    }

    async fn stop(&self) -> Result<String, GatewayError> {
        let mut state = self.state()?;
        if !state.status.is_active() {
            return Err(GatewayError::Command("No recording in progress".to_string()));
        }

        let path = format!("{}/recording_{}.mkv", state.output_dir, state.recordings);
        state.status = RecordingStatus::Idle;
        state.elapsed_seconds = 0.0;
        state.last_output = Some(path.clone());
        let payload = state.session_payload(true);
        state.broadcast(EventChannel::SessionUpdate, payload);
        Ok(path)
    }

    async fn pause(&self) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        state.status = match state.status {
            RecordingStatus::Recording => RecordingStatus::Paused,
            RecordingStatus::Paused => RecordingStatus::Recording,
            RecordingStatus::Idle => {
                return Err(GatewayError::Command("No recording in progress".to_string()));
            }
        };
        let payload = state.session_payload(false);
        state.broadcast(EventChannel::SessionUpdate, payload);
        Ok(())
    }

    async fn get_status(&self) -> Result<Value, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state()?;
        Ok(state.session_payload(false))
    }

    async fn list_monitors(&self) -> Result<Vec<Value>, GatewayError> {
        let state = self.state()?;
        if let Some(message) = &state.monitor_failure {
            return Err(GatewayError::Command(message.clone()));
        }
        Ok(state
            .monitors
            .iter()
            .map(|monitor| {
                serde_json::to_value(MonitorPayload {
                    id: monitor.id.clone(),
                    name: monitor.display_name.clone(),
                    width: monitor.width_px,
                    height: monitor.height_px,
                })
                .unwrap_or(Value::Null)
            })
            .collect())
    }

    async fn list_windows(&self) -> Result<Vec<Value>, GatewayError> {
        let state = self.state()?;
        if let Some(message) = &state.window_failure {
            return Err(GatewayError::Command(message.clone()));
        }
        Ok(state
            .windows
            .iter()
            .map(|window| {
                serde_json::to_value(WindowPayload {
                    id: window.id.clone(),
                    title: window.title.clone(),
                })
                .unwrap_or(Value::Null)
            })
            .collect())
    }

    async fn get_timeline(&self) -> Result<Vec<Value>, GatewayError> {
        self.timeline_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state()?;
        Ok(state.timeline.iter().map(timeline_value).collect())
    }

    async fn subscribe(&self, channel: EventChannel) -> Result<Subscription, GatewayError> {
        let mut state = self.state()?;
        if state.refused_channels.contains(&channel) {
            return Err(GatewayError::Subscribe {
                channel,
                reason: "event bridge unavailable".to_string(),
            });
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state
            .listeners
            .entry(channel)
            .or_default()
            .push(Listener { id, sender });

        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(channel, receiver, move || {
            if let Some(inner) = inner.upgrade()
                && let Ok(mut state) = inner.lock()
                && let Some(listeners) = state.listeners.get_mut(&channel)
            {
                listeners.retain(|listener| listener.id != id);
            }
        }))
    }
}

fn timeline_value(point: &TimelinePoint) -> Value {
    serde_json::to_value(TimelinePayload::from(point)).unwrap_or(Value::Null)
}
