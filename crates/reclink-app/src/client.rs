use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use reclink_core::sidecar::TimelineSidecar;
use reclink_core::{DeviceDescriptor, MetricsSample, RecordingStatus, SessionState};
use reclink_devices::{DeviceInventory, DeviceLists};
use reclink_gateway::BackendGateway;
use reclink_session::{Command, CommandError, ObserverId, SessionEvent, SessionReconciler};
use reclink_telemetry::{MetricsGauge, TimelineAggregator, TimelineSettle, TimelineSnapshot};
use reclink_transport::{ChannelReport, SessionTransport, TransportSelector, TransportSinks};
use reclink_ui::{MetricsLabels, StatusView};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{AppError, ClientConfig, app_version};

/// What a start command records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    /// A monitor, by id.
    Monitor(String),
    /// A window, by id.
    Window(String),
}

impl From<&DeviceDescriptor> for CaptureTarget {
    fn from(device: &DeviceDescriptor) -> Self {
        match device {
            DeviceDescriptor::Monitor(monitor) => Self::Monitor(monitor.id.clone()),
            DeviceDescriptor::Window(window) => Self::Window(window.id.clone()),
        }
    }
}

impl From<CaptureTarget> for Command {
    fn from(target: CaptureTarget) -> Self {
        match target {
            CaptureTarget::Monitor(id) => Command::start_monitor(id),
            CaptureTarget::Window(id) => Command::start_window(id),
        }
    }
}

type PendingSettle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Recorder front-end: session reconciliation, telemetry and transport wired
/// to one backend.
pub struct RecorderClient {
    session: Arc<SessionReconciler>,
    metrics: Arc<MetricsGauge>,
    timeline: Arc<TimelineAggregator>,
    devices: DeviceInventory,
    transport: TransportSelector,
    settling: PendingSettle,
}

impl RecorderClient {
    /// Connects to `gateway`: registers the lifecycle hooks, syncs status
    /// once and activates the transport.
    ///
    /// Must be called inside a tokio runtime. A failed initial sync is logged
    /// and the client starts from the idle state.
    pub async fn connect(gateway: Arc<dyn BackendGateway>, config: ClientConfig) -> Self {
        let session = Arc::new(SessionReconciler::new(gateway.clone()));
        let metrics = Arc::new(MetricsGauge::new());
        let timeline = Arc::new(TimelineAggregator::new());
        let settling: PendingSettle = Arc::new(Mutex::new(None));

        session.subscribe(lifecycle_hook(
            gateway.clone(),
            metrics.clone(),
            timeline.clone(),
            settling.clone(),
        ));

        if let Err(error) = session.resync().await {
            warn!(event = "initial_sync_failed", error = %error);
        }

        let sinks = TransportSinks {
            session: session.clone(),
            metrics: metrics.clone(),
            timeline: timeline.clone(),
        };
        let transport =
            TransportSelector::activate(gateway.clone(), sinks, config.transport()).await;

        info!(
            event = "client_connected",
            version = app_version(),
            transport = transport.mode().label()
        );

        Self {
            session,
            metrics,
            timeline,
            devices: DeviceInventory::new(gateway),
            transport,
            settling,
        }
    }

    /// Starts recording `target`.
    ///
    /// # Errors
    /// See [`SessionReconciler::issue`].
    pub async fn start(&self, target: CaptureTarget) -> Result<(), CommandError> {
        self.session.issue(target.into()).await
    }

    /// Stops the active recording.
    ///
    /// # Errors
    /// See [`SessionReconciler::issue`].
    pub async fn stop(&self) -> Result<(), CommandError> {
        self.session.issue(Command::Stop).await
    }

    /// Toggles pause.
    ///
    /// # Errors
    /// See [`SessionReconciler::issue`].
    pub async fn pause(&self) -> Result<(), CommandError> {
        self.session.issue(Command::Pause).await
    }

    /// Current session state.
    pub fn session(&self) -> SessionState {
        self.session.snapshot()
    }

    /// Latest metrics sample.
    pub fn metrics(&self) -> MetricsSample {
        self.metrics.latest()
    }

    /// Current timeline.
    pub fn timeline(&self) -> TimelineSnapshot {
        self.timeline.snapshot()
    }

    /// Display projection of the session.
    pub fn status_view(&self) -> StatusView {
        StatusView::project(
            &self.session.snapshot(),
            self.transport.mode().label(),
            app_version(),
        )
    }

    /// Display projection of the latest metrics.
    pub fn metrics_labels(&self) -> MetricsLabels {
        MetricsLabels::project(&self.metrics.latest())
    }

    /// Session transport chosen at connect.
    pub fn transport_mode(&self) -> SessionTransport {
        self.transport.mode()
    }

    /// Per-channel transport outcome.
    pub fn channel_report(&self) -> &[ChannelReport] {
        self.transport.channel_report()
    }

    /// Registers a session observer.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        self.session.subscribe(callback)
    }

    /// Removes a session observer.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.session.unsubscribe(id)
    }

    /// Lists capture targets.
    pub async fn refresh_devices(&self) -> DeviceLists {
        self.devices.refresh().await
    }

    /// Waits for the post-session timeline fetch, if one is running.
    pub async fn timeline_settled(&self) {
        let pending = self
            .settling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending
            && let Err(error) = task.await
        {
            warn!(event = "timeline_settle_task_failed", error = %error);
        }
    }

    /// Replaces the timeline with a recording's sidecar file.
    ///
    /// Returns the number of loaded points.
    ///
    /// # Errors
    /// Returns [`AppError::Sidecar`] when the file is missing or malformed;
    /// the current timeline is kept.
    pub async fn load_timeline_sidecar(&self, path: &Path) -> Result<usize, AppError> {
        let path = path.to_path_buf();
        let sidecar = tokio::task::spawn_blocking(move || TimelineSidecar::load(&path))
            .await
            .map_err(|error| AppError::Task(error.to_string()))??;
        let points = sidecar.points();
        let count = points.len();
        self.timeline.replace(points);
        info!(event = "sidecar_loaded", video_path = %sidecar.video_path, points = count);
        Ok(count)
    }

    /// Tears the transport down. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        self.transport.dispose().await;
    }
}

fn lifecycle_hook(
    gateway: Arc<dyn BackendGateway>,
    metrics: Arc<MetricsGauge>,
    timeline: Arc<TimelineAggregator>,
    settling: PendingSettle,
) -> impl Fn(&SessionEvent) + Send + Sync + 'static {
    let runtime = Handle::current();
    move |event| {
        let SessionEvent::Changed {
            previous, current, ..
        } = event
        else {
            return;
        };

        if !previous.status.is_active() && current.status.is_active() {
            timeline.on_recording_start();
            metrics.reset();
        } else if previous.status.is_active() && current.status == RecordingStatus::Idle {
            metrics.reset();
            // Settled before the fetch is spawned, so an immediate restart
            // supersedes it.
            let generation = timeline.begin_settle();
            let gateway = gateway.clone();
            let timeline = timeline.clone();
            let task = runtime.spawn(async move {
                match timeline.finish_settle(generation, gateway.as_ref()).await {
                    TimelineSettle::Superseded => {
                        debug!(event = "timeline_settle_superseded", generation);
                    }
                    TimelineSettle::Replaced { .. } | TimelineSettle::Kept(_) => {}
                }
            });
            *settling.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        }
    }
}
