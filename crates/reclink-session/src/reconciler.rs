use std::sync::{Arc, PoisonError, RwLock};

use reclink_core::wire::{self, WireError};
use reclink_core::{RecordingStatus, SessionState};
use reclink_gateway::{BackendGateway, GatewayError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::classify::{CommandError, RecoveryAction};
use crate::observers::{ObserverId, Observers};

/// Imperative request sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start capturing exactly one of the given targets.
    Start {
        /// Monitor to capture.
        monitor_id: Option<String>,
        /// Window to capture.
        window_id: Option<String>,
    },
    /// Stop the active recording.
    Stop,
    /// Toggle pause on the active recording.
    Pause,
}

impl Command {
    /// Start command targeting a monitor.
    pub fn start_monitor(monitor_id: impl Into<String>) -> Self {
        Self::Start {
            monitor_id: Some(monitor_id.into()),
            window_id: None,
        }
    }

    /// Start command targeting a window.
    pub fn start_window(window_id: impl Into<String>) -> Self {
        Self::Start {
            monitor_id: None,
            window_id: Some(window_id.into()),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
        }
    }
}

/// Where a state write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// Local guess after a successful command.
    Optimistic,
    /// Backend snapshot, command confirmation or resync.
    Authoritative,
}

/// Notification published by [`SessionReconciler`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Local state was replaced.
    Changed {
        /// State before the write.
        previous: SessionState,
        /// State after the write.
        current: SessionState,
        /// Kind of write.
        origin: UpdateOrigin,
    },
    /// A recording finished. Published once per completed session.
    RecordingCompleted {
        /// Finished recording location.
        output_path: String,
    },
}

/// Failure while re-reading authoritative status.
#[derive(Debug, Error)]
pub enum ResyncError {
    /// Status request failed.
    #[error("status request failed: {0}")]
    Gateway(#[from] GatewayError),
    /// Status payload was not decodable.
    #[error(transparent)]
    Decode(#[from] WireError),
}

#[derive(Debug, Default)]
struct Ledger {
    state: SessionState,
    announced_output: Option<String>,
}

/// Owns the client copy of session state and serializes every write to it.
///
/// Commands, push updates and poll results all funnel through one FIFO async
/// lock. A command holds the lock across its backend call, so a push update
/// that arrives meanwhile is applied after the command's own write.
pub struct SessionReconciler {
    gateway: Arc<dyn BackendGateway>,
    ledger: Mutex<Ledger>,
    published: RwLock<SessionState>,
    observers: RwLock<Observers<SessionEvent>>,
}

impl SessionReconciler {
    /// Creates a reconciler in the idle state.
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            gateway,
            ledger: Mutex::new(Ledger::default()),
            published: RwLock::new(SessionState::idle()),
            observers: RwLock::new(Observers::new()),
        }
    }

    /// Latest applied state.
    pub fn snapshot(&self) -> SessionState {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registers an observer for state changes and completions.
    ///
    /// Callbacks run synchronously inside the write that triggers them and
    /// must not call back into [`SessionReconciler::subscribe`] or
    /// [`SessionReconciler::unsubscribe`].
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(callback)
    }

    /// Removes an observer. Returns `false` for unknown ids.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unsubscribe(id)
    }

    /// Sends `command` to the backend and reconciles local state with the
    /// outcome.
    ///
    /// # Errors
    /// - [`CommandError::Validation`] when a start does not name exactly one
    ///   target. The backend is not called.
    /// - [`CommandError::AlreadyInProgress`] after local state has been
    ///   resynced from the backend.
    /// - [`CommandError::UnsupportedPlatform`] or [`CommandError::Unknown`]
    ///   for other backend failures; local state is untouched.
    pub async fn issue(&self, command: Command) -> Result<(), CommandError> {
        let mut ledger = self.ledger.lock().await;
        debug!(event = "command_issued", command = command.name());

        match &command {
            Command::Start {
                monitor_id,
                window_id,
            } => {
                let (monitor_id, window_id) = capture_target(monitor_id, window_id)?;
                match self.gateway.start(monitor_id, window_id).await {
                    Ok(()) => {
                        self.apply_locked(
                            &mut ledger,
                            SessionState::recording_started(),
                            UpdateOrigin::Optimistic,
                        );
                        Ok(())
                    }
                    Err(error) => {
                        let error = CommandError::from(error);
                        if error.recovery() == RecoveryAction::Resync {
                            if let Err(resync_error) = self.resync_locked(&mut ledger).await {
                                warn!(
                                    event = "resync_failed",
                                    command = command.name(),
                                    error = %resync_error
                                );
                            }
                        }
                        Err(self.report(&command, error))
                    }
                }
            }
            Command::Pause => match self.gateway.pause().await {
                Ok(()) => {
                    let mut next = ledger.state.clone();
                    next.status = match next.status {
                        RecordingStatus::Recording => RecordingStatus::Paused,
                        RecordingStatus::Paused => RecordingStatus::Recording,
                        RecordingStatus::Idle => RecordingStatus::Idle,
                    };
                    self.apply_locked(&mut ledger, next, UpdateOrigin::Optimistic);
                    Ok(())
                }
                Err(error) => Err(self.report(&command, error.into())),
            },
            Command::Stop => match self.gateway.stop().await {
                Ok(output_path) => {
                    self.apply_locked(
                        &mut ledger,
                        SessionState::stopped(output_path),
                        UpdateOrigin::Authoritative,
                    );
                    Ok(())
                }
                Err(error) => Err(self.report(&command, error.into())),
            },
        }
    }

    /// Replaces local state with a backend snapshot.
    ///
    /// The snapshot wins over any optimistic guess, including a lower elapsed
    /// time than the one shown.
    pub async fn apply_authoritative(&self, update: SessionState) {
        let mut ledger = self.ledger.lock().await;
        self.apply_locked(&mut ledger, update, UpdateOrigin::Authoritative);
    }

    /// Re-reads backend status and applies it authoritatively.
    ///
    /// # Errors
    /// Returns [`ResyncError`] when the status request or its decoding fails;
    /// local state is untouched in that case.
    pub async fn resync(&self) -> Result<(), ResyncError> {
        let mut ledger = self.ledger.lock().await;
        self.resync_locked(&mut ledger).await
    }

    async fn resync_locked(&self, ledger: &mut Ledger) -> Result<(), ResyncError> {
        let payload = self.gateway.get_status().await?;
        let update = wire::decode_session(payload)?;
        self.apply_locked(ledger, update, UpdateOrigin::Authoritative);
        Ok(())
    }

    fn apply_locked(&self, ledger: &mut Ledger, next: SessionState, origin: UpdateOrigin) {
        let previous = std::mem::replace(&mut ledger.state, next.clone());
        if !previous.status.is_active() && next.status.is_active() {
            // New session: its completion may reuse the previous output path.
            ledger.announced_output = None;
        }
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next.clone();

        let completed = match origin {
            UpdateOrigin::Authoritative => next
                .completed_output(previous.status)
                .filter(|path| ledger.announced_output.as_deref() != Some(*path))
                .map(str::to_string),
            UpdateOrigin::Optimistic => None,
        };

        if previous != next {
            let authoritative = origin == UpdateOrigin::Authoritative;
            debug!(
                event = "session_changed",
                from = previous.status.label(),
                to = next.status.label(),
                elapsed_seconds = next.elapsed_seconds,
                authoritative
            );
        }

        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        observers.notify(&SessionEvent::Changed {
            previous,
            current: next,
            origin,
        });

        if let Some(output_path) = completed {
            info!(event = "recording_completed", output_path = %output_path);
            ledger.announced_output = Some(output_path.clone());
            observers.notify(&SessionEvent::RecordingCompleted { output_path });
        }
    }

    fn report(&self, command: &Command, error: CommandError) -> CommandError {
        warn!(
            event = "command_failed",
            command = command.name(),
            kind = ?error.kind(),
            error = %error
        );
        error
    }
}

fn capture_target<'a>(
    monitor_id: &'a Option<String>,
    window_id: &'a Option<String>,
) -> Result<(Option<&'a str>, Option<&'a str>), CommandError> {
    let monitor_id = monitor_id.as_deref().filter(|id| !id.trim().is_empty());
    let window_id = window_id.as_deref().filter(|id| !id.trim().is_empty());

    match (monitor_id, window_id) {
        (None, None) => Err(CommandError::Validation(
            "start needs a monitor or a window".to_string(),
        )),
        (Some(_), Some(_)) => Err(CommandError::Validation(
            "start accepts a monitor or a window, not both".to_string(),
        )),
        target => Ok(target),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for command reconciliation.

    use std::sync::Mutex as StdMutex;

    use reclink_gateway::SyntheticGateway;

    use super::*;

    fn reconciler() -> (Arc<SyntheticGateway>, SessionReconciler) {
        let gateway = Arc::new(SyntheticGateway::new());
        let reconciler = SessionReconciler::new(gateway.clone());
        (gateway, reconciler)
    }

    #[tokio::test]
    async fn start_then_pause_toggles_optimistically() {
        let (_gateway, reconciler) = reconciler();

        reconciler
            .issue(Command::start_monitor("monitor-1"))
            .await
            .expect("start");
        assert_eq!(reconciler.snapshot().status, RecordingStatus::Recording);

        reconciler.issue(Command::Pause).await.expect("pause");
        assert_eq!(reconciler.snapshot().status, RecordingStatus::Paused);

        reconciler.issue(Command::Pause).await.expect("resume");
        assert_eq!(reconciler.snapshot().status, RecordingStatus::Recording);
    }

    #[tokio::test]
    async fn both_targets_fail_validation_without_backend_call() {
        let (gateway, reconciler) = reconciler();

        let error = reconciler
            .issue(Command::Start {
                monitor_id: Some("monitor-1".to_string()),
                window_id: Some("window-1".to_string()),
            })
            .await
            .expect_err("both targets");

        assert!(matches!(error, CommandError::Validation(_)));
        assert_eq!(gateway.start_calls(), 0);
    }

    #[tokio::test]
    async fn blank_target_counts_as_missing() {
        let (gateway, reconciler) = reconciler();

        let error = reconciler
            .issue(Command::start_window("  "))
            .await
            .expect_err("blank target");

        assert!(matches!(error, CommandError::Validation(_)));
        assert_eq!(gateway.start_calls(), 0);
    }

    #[tokio::test]
    async fn stop_publishes_completion_once() {
        let (_gateway, reconciler) = reconciler();
        let completions = Arc::new(StdMutex::new(Vec::new()));
        let sink = completions.clone();
        reconciler.subscribe(move |event| {
            if let SessionEvent::RecordingCompleted { output_path } = event {
                sink.lock().expect("sink").push(output_path.clone());
            }
        });

        reconciler
            .issue(Command::start_monitor("monitor-1"))
            .await
            .expect("start");
        reconciler.issue(Command::Stop).await.expect("stop");

        let state = reconciler.snapshot();
        assert_eq!(state.status, RecordingStatus::Idle);
        assert_eq!(state.elapsed_seconds, 0.0);
        let path = state.last_output_path.expect("output path");
        assert_eq!(*completions.lock().expect("sink"), vec![path]);
    }
}
