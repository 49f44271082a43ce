#![warn(missing_docs)]
//! # reclink-app
//!
//! ## Purpose
//! Wires session reconciliation, telemetry, devices and transport into one
//! [`RecorderClient`] for the recorder shell.
//!
//! ## Responsibilities
//! - Connect to a backend: lifecycle hooks, initial status sync, transport.
//! - Reset telemetry when a recording starts and settle the timeline when it
//!   ends.
//! - Load configuration from the environment and install logging.
//! - Load persisted timeline sidecars for finished recordings.
//!
//! ## Data flow
//! Shell action -> [`RecorderClient`] command -> reconciler -> observers.
//! Backend push/poll -> transport -> reconciler / gauge / timeline ->
//! [`RecorderClient::status_view`] for rendering.
//!
//! ## Ownership and lifetimes
//! The client owns every component through `Arc`s shared with transport
//! tasks; [`RecorderClient::shutdown`] (or drop) ends those tasks.
//!
//! ## Error model
//! Command failures surface as [`reclink_session::CommandError`]. Setup and
//! file failures are wrapped in [`AppError`]. Transport and telemetry failures
//! are logged, never surfaced.

mod client;
mod config;

use reclink_core::sidecar::SidecarError;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub use client::{CaptureTarget, RecorderClient};
pub use config::{
    ClientConfig, ConfigError, LOG_ENV, POLL_INTERVAL_ENV, PUSH_EVENTS_ENV,
    push_events_enabled_from_env,
};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("RECLINK_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Installs the global `tracing` subscriber.
///
/// Filter directives come from `RECLINK_LOG` (e.g. `reclink_session=debug`),
/// defaulting to `info`. Calling this twice keeps the first subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid environment configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Sidecar file could not be loaded.
    #[error("sidecar error: {0}")]
    Sidecar(#[from] SidecarError),
    /// Command rejected by the backend.
    #[error("command error: {0}")]
    Command(#[from] reclink_session::CommandError),
    /// Background task failed to complete.
    #[error("task error: {0}")]
    Task(String),
}
