#![warn(missing_docs)]
//! # reclink-gateway
//!
//! ## Purpose
//! Describes the recording backend as seen from the client: imperative
//! commands plus push-event channels.
//!
//! ## Responsibilities
//! - Define the backend-agnostic [`BackendGateway`] trait.
//! - Provide [`Subscription`], an owned push-event stream that unlistens on
//!   drop.
//! - Provide [`SyntheticGateway`], a deterministic in-memory backend for tests,
//!   demos and CI.
//!
//! ## Data flow
//! Client command -> [`BackendGateway`] -> backend result or failure message.
//! Backend state change -> event channel -> [`Subscription`] -> client pump.
//!
//! ## Ownership and lifetimes
//! Payloads cross the boundary as owned `serde_json::Value`s; decoding into the
//! model happens client-side in `reclink-core::wire`.
//!
//! ## Error model
//! Command failures carry the backend's message verbatim in
//! [`GatewayError::Command`] so callers can classify them by wording.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

mod synthetic;

pub use synthetic::SyntheticGateway;

/// Push-event channels exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventChannel {
    /// Session lifecycle snapshots.
    SessionUpdate,
    /// Encoder and process metrics.
    MetricsUpdate,
    /// Single analytics timeline points.
    AnalyticsUpdate,
}

impl EventChannel {
    /// All channels in activation order.
    pub const ALL: [EventChannel; 3] = [
        EventChannel::SessionUpdate,
        EventChannel::MetricsUpdate,
        EventChannel::AnalyticsUpdate,
    ];

    /// Backend event name.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::SessionUpdate => "session-update",
            Self::MetricsUpdate => "metrics-update",
            Self::AnalyticsUpdate => "analytics-update",
        }
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Owned stream of push payloads for one channel.
///
/// Dropping the subscription unlistens from the backend.
pub struct Subscription {
    channel: EventChannel,
    receiver: mpsc::UnboundedReceiver<Value>,
    unlisten: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription over `receiver`; `unlisten` runs exactly once,
    /// on [`Subscription::unlisten`] or drop.
    pub fn new(
        channel: EventChannel,
        receiver: mpsc::UnboundedReceiver<Value>,
        unlisten: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            channel,
            receiver,
            unlisten: Some(Box::new(unlisten)),
        }
    }

    /// Channel this subscription listens to.
    pub fn channel(&self) -> EventChannel {
        self.channel
    }

    /// Waits for the next payload. Returns `None` once the backend closes the
    /// channel.
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }

    /// Unlistens explicitly.
    pub fn unlisten(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.receiver.close();
        if let Some(unlisten) = self.unlisten.take() {
            unlisten();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("listening", &self.unlisten.is_some())
            .finish()
    }
}

/// Client view of the recording backend.
///
/// Implementations must be cheap to share behind `Arc`; every method may be
/// called concurrently.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Starts a recording of the given monitor or window.
    ///
    /// # Errors
    /// Returns [`GatewayError::Command`] with the backend's message when the
    /// backend refuses (session already active, unsupported platform, ...).
    async fn start(
        &self,
        monitor_id: Option<&str>,
        window_id: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Stops the active recording and returns the output path.
    ///
    /// # Errors
    /// Returns [`GatewayError::Command`] when nothing is recording.
    async fn stop(&self) -> Result<String, GatewayError>;

    /// Toggles pause on the active recording.
    ///
    /// # Errors
    /// Returns [`GatewayError::Command`] when nothing is recording.
    async fn pause(&self) -> Result<(), GatewayError>;

    /// Reads the authoritative session payload.
    async fn get_status(&self) -> Result<Value, GatewayError>;

    /// Lists capturable monitors.
    async fn list_monitors(&self) -> Result<Vec<Value>, GatewayError>;

    /// Lists capturable windows.
    async fn list_windows(&self) -> Result<Vec<Value>, GatewayError>;

    /// Reads the persisted analytics timeline of the latest session.
    async fn get_timeline(&self) -> Result<Vec<Value>, GatewayError>;

    /// Subscribes to one push channel.
    ///
    /// # Errors
    /// Returns [`GatewayError::Subscribe`] when the event bridge is not
    /// available.
    async fn subscribe(&self, channel: EventChannel) -> Result<Subscription, GatewayError>;
}

/// Gateway failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Backend rejected a command. The message is the backend's wording.
    #[error("{0}")]
    Command(String),
    /// Push channel could not be subscribed.
    #[error("cannot subscribe to {channel}: {reason}")]
    Subscribe {
        /// Channel that failed.
        channel: EventChannel,
        /// Backend or bridge reason.
        reason: String,
    },
    /// Backend could not be reached at all.
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}
