//! Command failure classification.
//!
//! The backend reports failures as free-form strings. All wording knowledge
//! lives here so reconciliation logic only sees [`CommandErrorKind`].

use reclink_gateway::GatewayError;
use thiserror::Error;

const ALREADY_IN_PROGRESS_PHRASES: &[&str] = &["already in progress"];
// "not implemented" and "not supported" are treated as one class until the
// backend contract distinguishes them.
const UNSUPPORTED_PHRASES: &[&str] = &["not implemented", "not supported"];
const VALIDATION_PHRASES: &[&str] = &["no capture source"];

/// Failure taxonomy for issued commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandErrorKind {
    /// Backend already has an active session.
    AlreadyInProgress,
    /// Backend lacks capture support on this platform.
    UnsupportedPlatform,
    /// Caller violated the command contract.
    Validation,
    /// Anything else.
    Unknown,
}

/// Recovery selected for a failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Re-read authoritative state, then inform the user.
    Resync,
    /// Surface to the user without touching state.
    Inform,
    /// Precondition failure at the call site; nothing to show.
    Ignore,
}

/// Classifies a backend failure message. Never fails; unmatched messages are
/// [`CommandErrorKind::Unknown`].
pub fn classify_failure(message: &str) -> CommandErrorKind {
    let lower = message.to_lowercase();
    let matches = |phrases: &[&str]| phrases.iter().any(|phrase| lower.contains(phrase));

    if matches(ALREADY_IN_PROGRESS_PHRASES) {
        CommandErrorKind::AlreadyInProgress
    } else if matches(UNSUPPORTED_PHRASES) {
        CommandErrorKind::UnsupportedPlatform
    } else if matches(VALIDATION_PHRASES) {
        CommandErrorKind::Validation
    } else {
        CommandErrorKind::Unknown
    }
}

/// Returns the recovery for a failure kind.
pub fn recovery_action(kind: CommandErrorKind) -> RecoveryAction {
    match kind {
        CommandErrorKind::AlreadyInProgress => RecoveryAction::Resync,
        CommandErrorKind::UnsupportedPlatform | CommandErrorKind::Unknown => RecoveryAction::Inform,
        CommandErrorKind::Validation => RecoveryAction::Ignore,
    }
}

/// Error returned by [`crate::SessionReconciler::issue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Start did not name exactly one capture target.
    #[error("invalid command: {0}")]
    Validation(String),
    /// Backend already records; local state has been resynced.
    #[error("recording already in progress: {0}")]
    AlreadyInProgress(String),
    /// Backend cannot capture on this platform.
    #[error("capture unsupported on this platform: {0}")]
    UnsupportedPlatform(String),
    /// Unclassified backend failure.
    #[error("command failed: {0}")]
    Unknown(String),
}

impl CommandError {
    /// Builds an error from a backend failure message.
    pub fn from_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        match classify_failure(&message) {
            CommandErrorKind::AlreadyInProgress => Self::AlreadyInProgress(message),
            CommandErrorKind::UnsupportedPlatform => Self::UnsupportedPlatform(message),
            CommandErrorKind::Validation => Self::Validation(message),
            CommandErrorKind::Unknown => Self::Unknown(message),
        }
    }

    /// Failure kind.
    pub fn kind(&self) -> CommandErrorKind {
        match self {
            Self::Validation(_) => CommandErrorKind::Validation,
            Self::AlreadyInProgress(_) => CommandErrorKind::AlreadyInProgress,
            Self::UnsupportedPlatform(_) => CommandErrorKind::UnsupportedPlatform,
            Self::Unknown(_) => CommandErrorKind::Unknown,
        }
    }

    /// Recovery for this error.
    pub fn recovery(&self) -> RecoveryAction {
        recovery_action(self.kind())
    }

    /// Text shown to the user, or `None` for contract violations.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(_) => None,
            Self::AlreadyInProgress(_) => Some(
                "Recording is already in progress. Use the Stop button to end it first."
                    .to_string(),
            ),
            Self::UnsupportedPlatform(_) => {
                Some("Screen capture is not supported on this platform yet.".to_string())
            }
            Self::Unknown(message) => Some(format!("Command failed: {message}")),
        }
    }
}

impl From<GatewayError> for CommandError {
    fn from(error: GatewayError) -> Self {
        Self::from_failure(error.to_string())
    }
}
