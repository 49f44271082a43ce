#![warn(missing_docs)]
//! # reclink-telemetry
//!
//! ## Purpose
//! Holds the performance gauge and the analytics timeline shown next to a
//! recording.
//!
//! ## Responsibilities
//! - Keep only the newest [`reclink_core::MetricsSample`] ([`MetricsGauge`]).
//! - Grow the timeline from live samples while a session runs and replace it
//!   with the persisted timeline once the session ends
//!   ([`TimelineAggregator`]).
//! - Hand out cheap, immutable [`TimelineSnapshot`]s for rendering.
//!
//! ## Data flow
//! `metrics-update` payload -> [`MetricsGauge::on_sample`].
//! `analytics-update` payload -> [`TimelineAggregator::on_live_sample`].
//! Session end -> [`TimelineAggregator::begin_settle`] ->
//! [`TimelineAggregator::finish_settle`] -> gateway `get_timeline` ->
//! wholesale replacement.
//! Polled `get_timeline` while recording -> [`TimelineAggregator::refresh_live`].
//!
//! ## Ownership and lifetimes
//! Timeline points live in fixed-size `Arc` chunks. Snapshots share the
//! chunks; an append copies at most the tail chunk while a snapshot holds it.
//!
//! ## Error model
//! Fetch failures are returned as [`TelemetryError`] inside
//! [`TimelineSettle::Kept`] and never discard live data.
//!
//! ## Example
//! ```rust
//! use reclink_core::TimelinePoint;
//! use reclink_telemetry::TimelineAggregator;
//!
//! let timeline = TimelineAggregator::new();
//! timeline.on_recording_start();
//! timeline.on_live_sample(TimelinePoint { time_seconds: 1.0, ..TimelinePoint::default() });
//! assert_eq!(timeline.snapshot().len(), 1);
//! ```

mod metrics;
mod timeline;

use reclink_core::WireError;
use reclink_gateway::GatewayError;
use thiserror::Error;

pub use metrics::MetricsGauge;
pub use timeline::{
    TimelineAggregator, TimelineIter, TimelinePhase, TimelineSettle, TimelineSnapshot,
};

/// Failure while fetching the persisted timeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Gateway refused or could not serve the request.
    #[error("timeline fetch failed: {0}")]
    Fetch(#[from] GatewayError),
    /// Persisted timeline was malformed.
    #[error(transparent)]
    Decode(#[from] WireError),
}
