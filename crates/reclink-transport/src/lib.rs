#![warn(missing_docs)]
//! # reclink-transport
//!
//! ## Purpose
//! Delivers backend state to the client, over push events when the backend
//! offers them and over status polling when it does not.
//!
//! ## Responsibilities
//! - Subscribe to the session, metrics and analytics channels independently.
//! - Fall back to one fixed-interval status poll when the session channel is
//!   unavailable or push is disabled by configuration.
//! - Fall back to polling the full timeline while a session runs when the
//!   analytics channel is unavailable.
//! - Tear everything down idempotently, with no delivery after teardown.
//!
//! ## Data flow
//! [`Subscription`](reclink_gateway::Subscription) payload or `get_status`
//! result -> `reclink-core::wire` decode -> [`SessionSink`], [`MetricsSink`]
//! or [`TimelineSink`].
//!
//! ## Ownership and lifetimes
//! Each subscription is owned by its pump task; aborting the task drops the
//! subscription, which unlistens from the backend.
//!
//! ## Error model
//! Subscription failures become [`TransportError::Unavailable`] entries in
//! [`TransportSelector::channel_report`] and are never surfaced to users.
//! Decode and poll failures are logged and skipped.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//!
//! use reclink_gateway::{EventChannel, SyntheticGateway};
//! use reclink_session::SessionReconciler;
//! use reclink_telemetry::{MetricsGauge, TimelineAggregator};
//! use reclink_transport::{SessionTransport, TransportConfig, TransportSelector, TransportSinks};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let gateway = Arc::new(SyntheticGateway::new().refuse_channel(EventChannel::SessionUpdate));
//! let sinks = TransportSinks {
//!     session: Arc::new(SessionReconciler::new(gateway.clone())),
//!     metrics: Arc::new(MetricsGauge::new()),
//!     timeline: Arc::new(TimelineAggregator::new()),
//! };
//! let selector = TransportSelector::activate(gateway, sinks, TransportConfig::default()).await;
//! assert!(matches!(selector.mode(), SessionTransport::PollActive { .. }));
//! selector.dispose().await;
//! # });
//! ```

mod selector;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reclink_core::{MetricsSample, SessionState, TimelinePoint};
use reclink_gateway::EventChannel;
use reclink_session::SessionReconciler;
use reclink_telemetry::{MetricsGauge, TimelineAggregator};
use thiserror::Error;

pub use selector::TransportSelector;

/// Reference poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Transport tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Period between status polls in poll mode.
    pub poll_interval: Duration,
    /// When `false`, no channel is subscribed and status is polled.
    pub push_enabled: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            push_enabled: true,
        }
    }
}

/// Session delivery mode, chosen once at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransport {
    /// Session updates arrive over the push channel.
    PushActive,
    /// Session status is polled.
    PollActive {
        /// Poll period.
        interval: Duration,
    },
}

impl SessionTransport {
    /// Short label for status displays.
    pub fn label(self) -> &'static str {
        match self {
            Self::PushActive => "live",
            Self::PollActive { .. } => "polling",
        }
    }
}

/// Activation outcome for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    /// Subscribed and pumping.
    Live,
    /// Push disabled by configuration; not attempted.
    Disabled,
    /// Subscription failed.
    Unavailable(TransportError),
}

/// One row of [`TransportSelector::channel_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    /// Channel concerned.
    pub channel: EventChannel,
    /// What happened at activation.
    pub state: ChannelState,
}

/// Transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Push channel could not be subscribed.
    #[error("{channel} unavailable: {reason}")]
    Unavailable {
        /// Channel that failed.
        channel: EventChannel,
        /// Gateway reason.
        reason: String,
    },
}

/// Receiver of authoritative session snapshots.
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Applies one backend snapshot.
    async fn apply_session(&self, update: SessionState);

    /// Whether the last applied state is recording or paused.
    fn session_active(&self) -> bool;
}

/// Receiver of metrics samples.
pub trait MetricsSink: Send + Sync {
    /// Stores one sample.
    fn on_metrics(&self, sample: MetricsSample);
}

/// Receiver of live timeline points.
pub trait TimelineSink: Send + Sync {
    /// Appends one point.
    fn on_timeline_point(&self, point: TimelinePoint);

    /// Generation of the session accepting live data, `None` once it ended.
    fn live_generation(&self) -> Option<u64>;

    /// Replaces the live timeline of session `generation` with a polled copy.
    fn on_timeline_refresh(&self, generation: u64, points: Vec<TimelinePoint>);
}

#[async_trait]
impl SessionSink for SessionReconciler {
    async fn apply_session(&self, update: SessionState) {
        self.apply_authoritative(update).await;
    }

    fn session_active(&self) -> bool {
        self.snapshot().status.is_active()
    }
}

impl MetricsSink for MetricsGauge {
    fn on_metrics(&self, sample: MetricsSample) {
        self.on_sample(sample);
    }
}

impl TimelineSink for TimelineAggregator {
    fn on_timeline_point(&self, point: TimelinePoint) {
        self.on_live_sample(point);
    }

    fn live_generation(&self) -> Option<u64> {
        TimelineAggregator::live_generation(self)
    }

    fn on_timeline_refresh(&self, generation: u64, points: Vec<TimelinePoint>) {
        self.refresh_live(generation, points);
    }
}

/// Destinations for delivered payloads.
#[derive(Clone)]
pub struct TransportSinks {
    /// Session snapshots.
    pub session: Arc<dyn SessionSink>,
    /// Metrics samples.
    pub metrics: Arc<dyn MetricsSink>,
    /// Live timeline points.
    pub timeline: Arc<dyn TimelineSink>,
}
