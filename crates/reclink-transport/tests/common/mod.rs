//! Shared fixtures for transport integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reclink_core::{MetricsSample, SessionState, TimelinePoint};
use reclink_gateway::{BackendGateway, EventChannel, GatewayError, Subscription};
use reclink_transport::{MetricsSink, SessionSink, TimelineSink, TransportSinks};
use serde_json::{Value, json};
use tokio::sync::Notify;

/// Push-less gateway with scripted status responses.
#[derive(Default)]
pub struct StatusGateway {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    pub status_entered: Notify,
    gate: Option<Notify>,
}

impl StatusGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// First `count` status requests fail.
    pub fn failing_first(count: usize) -> Self {
        let gateway = Self::default();
        gateway.failures_left.store(count, Ordering::SeqCst);
        gateway
    }

    /// Status requests block until [`StatusGateway::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_waiters();
        }
    }

    pub fn status_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendGateway for StatusGateway {
    async fn start(&self, _: Option<&str>, _: Option<&str>) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn stop(&self) -> Result<String, GatewayError> {
        Ok(String::new())
    }

    async fn pause(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn get_status(&self) -> Result<Value, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.status_entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GatewayError::Unreachable("status timed out".to_string()));
        }
        Ok(json!({ "is_recording": true, "is_paused": false, "duration": call as f64 }))
    }

    async fn list_monitors(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn list_windows(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn get_timeline(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn subscribe(&self, channel: EventChannel) -> Result<Subscription, GatewayError> {
        Err(GatewayError::Subscribe {
            channel,
            reason: "event bridge unavailable".to_string(),
        })
    }
}

/// Sink that records everything it receives.
#[derive(Default)]
pub struct RecordingSinks {
    pub sessions: Mutex<Vec<SessionState>>,
    pub metrics: Mutex<Vec<MetricsSample>>,
    pub points: Mutex<Vec<TimelinePoint>>,
    pub refreshes: Mutex<Vec<Vec<TimelinePoint>>>,
}

impl RecordingSinks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sessions(&self) -> Vec<SessionState> {
        self.sessions.lock().expect("sessions").clone()
    }

    pub fn as_sinks(self: &Arc<Self>) -> TransportSinks {
        TransportSinks {
            session: self.clone(),
            metrics: self.clone(),
            timeline: self.clone(),
        }
    }
}

#[async_trait]
impl SessionSink for RecordingSinks {
    async fn apply_session(&self, update: SessionState) {
        self.sessions.lock().expect("sessions").push(update);
    }

    fn session_active(&self) -> bool {
        self.sessions
            .lock()
            .expect("sessions")
            .last()
            .is_some_and(|state| state.status.is_active())
    }
}

impl MetricsSink for RecordingSinks {
    fn on_metrics(&self, sample: MetricsSample) {
        self.metrics.lock().expect("metrics").push(sample);
    }
}

impl TimelineSink for RecordingSinks {
    fn on_timeline_point(&self, point: TimelinePoint) {
        self.points.lock().expect("points").push(point);
    }

    fn live_generation(&self) -> Option<u64> {
        Some(0)
    }

    fn on_timeline_refresh(&self, _generation: u64, points: Vec<TimelinePoint>) {
        self.refreshes.lock().expect("refreshes").push(points);
    }
}
