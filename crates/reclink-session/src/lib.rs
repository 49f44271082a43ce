#![warn(missing_docs)]
//! # reclink-session
//!
//! ## Purpose
//! Keeps the client's copy of the recording session consistent with the
//! backend while commands, push updates and poll results interleave.
//!
//! ## Responsibilities
//! - Issue start, stop and pause through [`reclink_gateway::BackendGateway`].
//! - Apply optimistic guesses after successful commands and let backend
//!   snapshots override them.
//! - Publish exactly one [`SessionEvent::RecordingCompleted`] per finished
//!   recording.
//! - Classify backend failure wording into [`CommandErrorKind`].
//!
//! ## Data flow
//! [`Command`] -> [`SessionReconciler::issue`] -> gateway -> optimistic or
//! authoritative write -> [`SessionEvent`] observers.
//! Push/poll payload -> [`SessionReconciler::apply_authoritative`] -> observers.
//!
//! ## Ownership and lifetimes
//! The reconciler owns the only mutable [`reclink_core::SessionState`].
//! Readers get clones through [`SessionReconciler::snapshot`].
//!
//! ## Error model
//! Command failures are returned as [`CommandError`]; resync failures inside a
//! command are logged and never replace the command's own error.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//!
//! use reclink_core::RecordingStatus;
//! use reclink_gateway::SyntheticGateway;
//! use reclink_session::{Command, SessionReconciler};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let reconciler = SessionReconciler::new(Arc::new(SyntheticGateway::new()));
//! reconciler.issue(Command::start_monitor("monitor-1")).await.unwrap();
//! assert_eq!(reconciler.snapshot().status, RecordingStatus::Recording);
//! # });
//! ```

pub mod classify;
pub mod observers;
mod reconciler;

pub use classify::{
    CommandError, CommandErrorKind, RecoveryAction, classify_failure, recovery_action,
};
pub use observers::{ObserverId, Observers};
pub use reconciler::{Command, ResyncError, SessionEvent, SessionReconciler, UpdateOrigin};
