//! Integration tests for partial-failure device enumeration.

use std::sync::Arc;

use reclink_core::{Monitor, WindowHandle};
use reclink_devices::DeviceInventory;
use reclink_gateway::SyntheticGateway;

fn windows(count: usize) -> Vec<WindowHandle> {
    (1..=count)
        .map(|index| WindowHandle {
            id: format!("window-{index}"),
            title: format!("Window {index}"),
        })
        .collect()
}

#[tokio::test]
async fn inventory_tests_monitor_failure_keeps_windows() {
    let gateway = SyntheticGateway::with_devices(Vec::new(), windows(3))
        .fail_monitor_listing("display server unreachable");
    let inventory = DeviceInventory::new(Arc::new(gateway));

    let lists = inventory.refresh().await;

    assert!(lists.monitors.is_empty());
    assert_eq!(lists.windows.len(), 3);
    assert_eq!(lists.windows[2].title, "Window 3");
}

#[tokio::test]
async fn inventory_tests_both_failures_yield_empty_lists() {
    let gateway = SyntheticGateway::new()
        .fail_monitor_listing("no monitors")
        .fail_window_listing("no windows");
    let inventory = DeviceInventory::new(Arc::new(gateway));

    assert!(inventory.refresh().await.is_empty());
}

#[tokio::test]
async fn inventory_tests_refresh_reflects_current_backend_lists() {
    let monitors = vec![
        Monitor {
            id: "0".to_string(),
            display_name: "Built-in".to_string(),
            width_px: 2560,
            height_px: 1600,
        },
        Monitor {
            id: "1".to_string(),
            display_name: "External".to_string(),
            width_px: 3840,
            height_px: 2160,
        },
    ];
    let inventory = DeviceInventory::new(Arc::new(SyntheticGateway::with_devices(
        monitors.clone(),
        Vec::new(),
    )));

    let lists = inventory.refresh().await;

    assert_eq!(lists.monitors, monitors);
    assert_eq!(lists.find_monitor("1").map(|m| m.display_name.as_str()), Some("External"));
}
