//! Environment-driven client configuration.

use std::time::Duration;

use reclink_transport::{DEFAULT_POLL_INTERVAL, TransportConfig};
use thiserror::Error;

/// Poll interval override in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "RECLINK_POLL_INTERVAL_MS";
/// Push-event kill switch.
pub const PUSH_EVENTS_ENV: &str = "RECLINK_PUSH_EVENTS";
/// Log filter directives.
pub const LOG_ENV: &str = "RECLINK_LOG";

/// Client settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Status poll period used when push is unavailable.
    pub poll_interval: Duration,
    /// Whether push channels are attempted at all.
    pub push_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            push_enabled: true,
        }
    }
}

impl ClientConfig {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPollInterval`] when
    /// `RECLINK_POLL_INTERVAL_MS` is zero or not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which returns a variable's value or
    /// `None` when unset.
    ///
    /// # Errors
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let poll_interval = match lookup(POLL_INTERVAL_ENV) {
            None => DEFAULT_POLL_INTERVAL,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(millis) if millis > 0 => Duration::from_millis(millis),
                _ => return Err(ConfigError::InvalidPollInterval { value: raw }),
            },
        };

        Ok(Self {
            poll_interval,
            push_enabled: switch_enabled(lookup(PUSH_EVENTS_ENV).as_deref()),
        })
    }

    /// Transport settings derived from this config.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            poll_interval: self.poll_interval,
            push_enabled: self.push_enabled,
        }
    }
}

/// Checks the push-event kill switch.
///
/// Semantics:
/// - Unset => push enabled.
/// - `0`, `false`, `off` (case-insensitive) => push disabled, status is polled.
/// - Any other value => push enabled.
pub fn push_events_enabled_from_env() -> bool {
    switch_enabled(std::env::var(PUSH_EVENTS_ENV).ok().as_deref())
}

fn switch_enabled(value: Option<&str>) -> bool {
    match value {
        Some(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        None => true,
    }
}

/// Configuration failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Poll interval was zero or unparsable.
    #[error("RECLINK_POLL_INTERVAL_MS must be a positive integer, got {value:?}")]
    InvalidPollInterval {
        /// Raw variable value.
        value: String,
    },
}
