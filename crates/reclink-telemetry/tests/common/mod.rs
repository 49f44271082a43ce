//! Shared fixtures for telemetry integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use reclink_gateway::{BackendGateway, EventChannel, GatewayError, Subscription};
use serde_json::{Value, json};
use tokio::sync::Notify;

/// Gateway serving a fixed timeline, optionally after a release signal.
pub struct TimelineGateway {
    timeline: Result<Vec<Value>, GatewayError>,
    pub fetch_entered: Notify,
    pub release_fetch: Option<Notify>,
}

impl TimelineGateway {
    pub fn serving(times: &[f64]) -> Self {
        Self {
            timeline: Ok(times
                .iter()
                .map(|time| json!({ "time": time, "brightness": 0.5 }))
                .collect()),
            fetch_entered: Notify::new(),
            release_fetch: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            timeline: Err(GatewayError::Command(message.to_string())),
            fetch_entered: Notify::new(),
            release_fetch: None,
        }
    }

    pub fn gated(mut self) -> Self {
        self.release_fetch = Some(Notify::new());
        self
    }
}

#[async_trait]
impl BackendGateway for TimelineGateway {
    async fn start(&self, _: Option<&str>, _: Option<&str>) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn stop(&self) -> Result<String, GatewayError> {
        Ok(String::new())
    }

    async fn pause(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn get_status(&self) -> Result<Value, GatewayError> {
        Ok(json!({}))
    }

    async fn list_monitors(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn list_windows(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn get_timeline(&self) -> Result<Vec<Value>, GatewayError> {
        self.fetch_entered.notify_one();
        if let Some(release) = &self.release_fetch {
            release.notified().await;
        }
        self.timeline.clone()
    }

    async fn subscribe(&self, channel: EventChannel) -> Result<Subscription, GatewayError> {
        Err(GatewayError::Subscribe {
            channel,
            reason: "not wired".to_string(),
        })
    }
}
