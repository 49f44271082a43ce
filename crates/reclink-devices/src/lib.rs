#![warn(missing_docs)]
//! # reclink-devices
//!
//! ## Purpose
//! Lists the monitors and windows a recording can target.
//!
//! ## Responsibilities
//! - Fetch both lists concurrently from the backend.
//! - Degrade each list independently to empty on failure.
//! - Look up a selected target by id.
//!
//! ## Data flow
//! [`DeviceInventory::refresh`] -> gateway `list_monitors` / `list_windows`
//! -> `reclink-core::wire` decode -> [`DeviceLists`].
//!
//! ## Error model
//! None surfaced. Failures are logged and yield an empty list, so one broken
//! enumeration never hides the other.

use std::sync::Arc;

use reclink_core::wire::{self, WireError};
use reclink_core::{Monitor, WindowHandle};
use reclink_gateway::{BackendGateway, GatewayError};
use serde_json::Value;
use tracing::{debug, warn};

/// Capturable targets from one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceLists {
    /// Monitors, in backend order.
    pub monitors: Vec<Monitor>,
    /// Windows, in backend order.
    pub windows: Vec<WindowHandle>,
}

impl DeviceLists {
    /// Finds a monitor by id.
    pub fn find_monitor(&self, id: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|monitor| monitor.id == id)
    }

    /// Finds a window by id.
    pub fn find_window(&self, id: &str) -> Option<&WindowHandle> {
        self.windows.iter().find(|window| window.id == id)
    }

    /// Returns `true` when neither list has entries.
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty() && self.windows.is_empty()
    }
}

/// Backend-backed device enumeration. Nothing is cached between refreshes.
#[derive(Clone)]
pub struct DeviceInventory {
    gateway: Arc<dyn BackendGateway>,
}

impl DeviceInventory {
    /// Creates an inventory over `gateway`.
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self { gateway }
    }

    /// Fetches both lists.
    pub async fn refresh(&self) -> DeviceLists {
        let (monitors, windows) =
            tokio::join!(self.gateway.list_monitors(), self.gateway.list_windows());

        let lists = DeviceLists {
            monitors: settle("monitors", monitors, wire::decode_monitors),
            windows: settle("windows", windows, wire::decode_windows),
        };
        debug!(
            event = "devices_refreshed",
            monitors = lists.monitors.len(),
            windows = lists.windows.len()
        );
        lists
    }
}

fn settle<T>(
    list: &'static str,
    fetched: Result<Vec<Value>, GatewayError>,
    decode: fn(Vec<Value>) -> Result<Vec<T>, WireError>,
) -> Vec<T> {
    let values = match fetched {
        Ok(values) => values,
        Err(error) => {
            warn!(event = "device_list_failed", list, error = %error);
            return Vec::new();
        }
    };

    decode(values).unwrap_or_else(|error| {
        warn!(event = "device_list_undecodable", list, error = %error);
        Vec::new()
    })
}
