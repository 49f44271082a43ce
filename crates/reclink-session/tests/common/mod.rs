//! Shared fixtures for reconciler integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reclink_gateway::{BackendGateway, EventChannel, GatewayError, Subscription};
use serde_json::{Value, json};
use tokio::sync::Notify;

/// Gateway whose start blocks until released, with scripted status.
#[derive(Default)]
pub struct GatedGateway {
    pub release_start: Notify,
    pub start_entered: Notify,
    pub status_calls: AtomicUsize,
}

impl GatedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendGateway for GatedGateway {
    async fn start(
        &self,
        _monitor_id: Option<&str>,
        _window_id: Option<&str>,
    ) -> Result<(), GatewayError> {
        self.start_entered.notify_one();
        self.release_start.notified().await;
        Ok(())
    }

    async fn stop(&self) -> Result<String, GatewayError> {
        Ok("/tmp/gated.mkv".to_string())
    }

    async fn pause(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn get_status(&self) -> Result<Value, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "is_recording": false, "is_paused": false, "duration": 0.0 }))
    }

    async fn list_monitors(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn list_windows(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn get_timeline(&self) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }

    async fn subscribe(&self, channel: EventChannel) -> Result<Subscription, GatewayError> {
        Err(GatewayError::Subscribe {
            channel,
            reason: "not wired".to_string(),
        })
    }
}
