use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reclink_core::wire::{self, WireError};
use reclink_gateway::{BackendGateway, EventChannel, Subscription};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::{
    ChannelReport, ChannelState, MetricsSink, SessionSink, SessionTransport, TimelineSink,
    TransportConfig, TransportError, TransportSinks,
};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Owns the active transport: push pumps, the fallback poll loops, or both.
///
/// Dropping the selector aborts its tasks; [`TransportSelector::dispose`]
/// additionally waits until every subscription has been released.
pub struct TransportSelector {
    mode: SessionTransport,
    timeline_polled: bool,
    report: Vec<ChannelReport>,
    disposed: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TransportSelector {
    /// Subscribes every channel and picks the session transport.
    ///
    /// Never fails: an unavailable session channel selects polling and other
    /// unavailable channels are reported in [`TransportSelector::channel_report`].
    pub async fn activate(
        gateway: Arc<dyn BackendGateway>,
        sinks: TransportSinks,
        config: TransportConfig,
    ) -> Self {
        let disposed = Arc::new(AtomicBool::new(false));
        let (shutdown, _) = watch::channel(false);
        let mut tasks = Vec::new();
        let mut report = Vec::with_capacity(EventChannel::ALL.len());

        for channel in EventChannel::ALL {
            let state = if !config.push_enabled {
                ChannelState::Disabled
            } else {
                match gateway.subscribe(channel).await {
                    Ok(subscription) => {
                        let route = Route::for_channel(channel, &sinks);
                        tasks.push(tokio::spawn(pump(
                            subscription,
                            route,
                            disposed.clone(),
                            shutdown.subscribe(),
                        )));
                        ChannelState::Live
                    }
                    Err(error) => {
                        warn!(
                            event = "channel_unavailable",
                            channel = channel.event_name(),
                            error = %error
                        );
                        ChannelState::Unavailable(TransportError::Unavailable {
                            channel,
                            reason: error.to_string(),
                        })
                    }
                }
            };
            report.push(ChannelReport { channel, state });
        }

        let live = |channel: EventChannel| {
            report
                .iter()
                .any(|row| row.channel == channel && row.state == ChannelState::Live)
        };
        let session_live = live(EventChannel::SessionUpdate);
        let timeline_polled = !live(EventChannel::AnalyticsUpdate);

        if timeline_polled {
            tasks.push(tokio::spawn(poll_timeline(
                gateway.clone(),
                sinks.session.clone(),
                sinks.timeline.clone(),
                config.poll_interval,
                disposed.clone(),
                shutdown.subscribe(),
            )));
        }
        let mode = if session_live {
            SessionTransport::PushActive
        } else {
            tasks.push(tokio::spawn(poll_status(
                gateway,
                sinks.session.clone(),
                config.poll_interval,
                disposed.clone(),
                shutdown.subscribe(),
            )));
            SessionTransport::PollActive {
                interval: config.poll_interval,
            }
        };

        info!(
            event = "transport_activated",
            mode = mode.label(),
            timeline_polled,
            push_enabled = config.push_enabled
        );

        Self {
            mode,
            timeline_polled,
            report,
            disposed,
            shutdown,
            tasks: Mutex::new(tasks),
        }
    }

    /// Session transport selected at activation.
    pub fn mode(&self) -> SessionTransport {
        self.mode
    }

    /// Returns `true` when the timeline is polled because the analytics
    /// channel is not live.
    pub fn timeline_polled(&self) -> bool {
        self.timeline_polled
    }

    /// Per-channel activation outcome, in [`EventChannel::ALL`] order.
    pub fn channel_report(&self) -> &[ChannelReport] {
        &self.report
    }

    /// Returns `true` once [`TransportSelector::dispose`] has begun.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Stops polling and unsubscribes every channel. Safe to call repeatedly.
    ///
    /// When this returns, no sink is called again, including for a poll that
    /// was in flight.
    pub async fn dispose(&self) {
        let already = self.disposed.swap(true, Ordering::SeqCst);
        let _ = self.shutdown.send(true);

        let tasks = {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *tasks)
        };
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            if let Err(error) = task.await
                && !error.is_cancelled()
            {
                warn!(event = "transport_task_failed", error = %error);
            }
        }

        if !already {
            debug!(event = "transport_disposed");
        }
    }
}

impl Drop for TransportSelector {
    fn drop(&mut self) {
        self.disposed.store(true, Ordering::SeqCst);
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

enum Route {
    Session(Arc<dyn SessionSink>),
    Metrics(Arc<dyn MetricsSink>),
    Timeline(Arc<dyn TimelineSink>),
}

impl Route {
    fn for_channel(channel: EventChannel, sinks: &TransportSinks) -> Self {
        match channel {
            EventChannel::SessionUpdate => Self::Session(sinks.session.clone()),
            EventChannel::MetricsUpdate => Self::Metrics(sinks.metrics.clone()),
            EventChannel::AnalyticsUpdate => Self::Timeline(sinks.timeline.clone()),
        }
    }

    async fn deliver(&self, payload: Value) -> Result<(), WireError> {
        match self {
            Self::Session(sink) => sink.apply_session(wire::decode_session(payload)?).await,
            Self::Metrics(sink) => sink.on_metrics(wire::decode_metrics(payload)?),
            Self::Timeline(sink) => {
                sink.on_timeline_point(wire::decode_timeline_point(payload)?);
            }
        }
        Ok(())
    }
}

async fn pump(
    mut subscription: Subscription,
    route: Route,
    disposed: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let channel = subscription.channel();
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            payload = subscription.recv() => {
                let Some(payload) = payload else {
                    debug!(event = "channel_closed", channel = channel.event_name());
                    break;
                };
                if disposed.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(error) = route.deliver(payload).await {
                    warn!(
                        event = "payload_skipped",
                        channel = channel.event_name(),
                        error = %error
                    );
                }
            }
        }
    }
}

async fn poll_status(
    gateway: Arc<dyn BackendGateway>,
    sink: Arc<dyn SessionSink>,
    period: Duration,
    disposed: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let polled = gateway.get_status().await;
                if disposed.load(Ordering::SeqCst) {
                    debug!(event = "poll_result_discarded");
                    break;
                }
                match polled {
                    Ok(payload) => match wire::decode_session(payload) {
                        Ok(update) => sink.apply_session(update).await,
                        Err(error) => warn!(event = "poll_payload_skipped", error = %error),
                    },
                    Err(error) => warn!(event = "poll_failed", error = %error),
                }
            }
        }
    }
}

// Fetches the whole timeline while a session runs and replaces the live
// buffer with it.
async fn poll_timeline(
    gateway: Arc<dyn BackendGateway>,
    session: Arc<dyn SessionSink>,
    sink: Arc<dyn TimelineSink>,
    period: Duration,
    disposed: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = ticker(period);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if !session.session_active() {
                    continue;
                }
                let Some(generation) = sink.live_generation() else {
                    continue;
                };
                let polled = gateway.get_timeline().await;
                if disposed.load(Ordering::SeqCst) {
                    debug!(event = "timeline_poll_discarded");
                    break;
                }
                match polled.map(wire::decode_timeline) {
                    Ok(Ok(points)) => sink.on_timeline_refresh(generation, points),
                    Ok(Err(error)) => warn!(event = "timeline_poll_skipped", error = %error),
                    Err(error) => warn!(event = "timeline_poll_failed", error = %error),
                }
            }
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let period = period.max(MIN_POLL_INTERVAL);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
