use std::sync::{Arc, PoisonError, RwLock};

use reclink_core::sidecar::TimelineSidecar;
use reclink_core::{TimelinePoint, wire};
use reclink_gateway::BackendGateway;
use tracing::{debug, info, warn};

use crate::TelemetryError;

/// Whether the timeline still accepts live samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelinePhase {
    /// Session running; live samples are appended.
    Live,
    /// Session ended; only a wholesale replacement changes the timeline.
    Settled,
}

/// Result of settling the timeline after a session ended.
#[derive(Debug)]
pub enum TimelineSettle {
    /// Persisted timeline replaced the live one.
    Replaced {
        /// Number of persisted points.
        points: usize,
    },
    /// A new session started while fetching; the fetched data was discarded.
    Superseded,
    /// Fetch failed; live data was kept.
    Kept(TelemetryError),
}

/// Points per storage chunk. Every chunk but the last is full.
const CHUNK_LEN: usize = 512;

type Chunk = Arc<Vec<TimelinePoint>>;

#[derive(Debug)]
struct Buffer {
    chunks: Vec<Chunk>,
    len: usize,
    phase: TimelinePhase,
    generation: u64,
}

impl Buffer {
    fn push(&mut self, point: TimelinePoint) {
        if self.chunks.last().is_none_or(|tail| tail.len() >= CHUNK_LEN) {
            self.chunks.push(Arc::new(Vec::with_capacity(CHUNK_LEN)));
        }
        if let Some(tail) = self.chunks.last_mut() {
            // Copies at most one chunk when a snapshot still holds the tail.
            Arc::make_mut(tail).push(point);
            self.len += 1;
        }
    }

    fn fill(&mut self, points: Vec<TimelinePoint>) {
        self.len = points.len();
        self.chunks = points
            .chunks(CHUNK_LEN)
            .map(|chunk| Arc::new(chunk.to_vec()))
            .collect();
    }
}

/// Analytics timeline for the current or most recent session.
///
/// Points are stored in fixed-size shared chunks, so taking a snapshot and
/// appending while one is held both stay cheap for hour-long sessions.
///
/// # Invariants
/// - Live samples are kept in arrival order.
/// - After a session ends the timeline equals the persisted timeline, unless
///   that fetch failed or was superseded by a new session.
#[derive(Debug)]
pub struct TimelineAggregator {
    buffer: RwLock<Buffer>,
}

impl TimelineAggregator {
    /// Creates an empty timeline accepting live samples.
    pub fn new() -> Self {
        Self {
            buffer: RwLock::new(Buffer {
                chunks: Vec::new(),
                len: 0,
                phase: TimelinePhase::Live,
                generation: 0,
            }),
        }
    }

    /// Clears the timeline for a new session.
    ///
    /// Any settle begun for an earlier session becomes superseded.
    pub fn on_recording_start(&self) {
        let mut buffer = self.write();
        buffer.fill(Vec::new());
        buffer.phase = TimelinePhase::Live;
        buffer.generation += 1;
        debug!(event = "timeline_cleared", generation = buffer.generation);
    }

    /// Appends one live sample. Ignored once the session has ended.
    pub fn on_live_sample(&self, point: TimelinePoint) {
        let mut buffer = self.write();
        if buffer.phase == TimelinePhase::Settled {
            debug!(event = "timeline_sample_ignored", time_seconds = point.time_seconds);
            return;
        }
        buffer.push(point);
    }

    /// Stops accepting live samples and replaces the timeline with the
    /// backend's persisted copy.
    ///
    /// Equivalent to [`TimelineAggregator::begin_settle`] followed by
    /// [`TimelineAggregator::finish_settle`].
    pub async fn on_session_ended(&self, gateway: &dyn BackendGateway) -> TimelineSettle {
        let generation = self.begin_settle();
        self.finish_settle(generation, gateway).await
    }

    /// Stops accepting live samples and returns the session generation to
    /// pass to [`TimelineAggregator::finish_settle`].
    ///
    /// Call this synchronously when the session ends, so a restart that
    /// follows immediately supersedes the pending fetch.
    pub fn begin_settle(&self) -> u64 {
        let mut buffer = self.write();
        buffer.phase = TimelinePhase::Settled;
        buffer.generation
    }

    /// Fetches the persisted timeline and installs it, unless a new session
    /// started after `generation` was taken.
    pub async fn finish_settle(
        &self,
        generation: u64,
        gateway: &dyn BackendGateway,
    ) -> TimelineSettle {
        let fetched = match gateway.get_timeline().await {
            Ok(values) => wire::decode_timeline(values).map_err(TelemetryError::from),
            Err(error) => Err(TelemetryError::from(error)),
        };

        let mut buffer = self.write();
        if buffer.generation != generation {
            return TimelineSettle::Superseded;
        }
        match fetched {
            Ok(points) => {
                let count = points.len();
                buffer.fill(points);
                info!(event = "timeline_settled", points = count);
                TimelineSettle::Replaced { points: count }
            }
            Err(error) => {
                warn!(event = "timeline_fetch_failed", error = %error);
                TimelineSettle::Kept(error)
            }
        }
    }

    /// Generation of the running session, or `None` once it has ended.
    pub fn live_generation(&self) -> Option<u64> {
        let buffer = self.read();
        (buffer.phase == TimelinePhase::Live).then_some(buffer.generation)
    }

    /// Replaces the live timeline with a full copy fetched during the
    /// session. Ignored when the session of `generation` has ended or been
    /// replaced. Returns `true` when applied.
    pub fn refresh_live(&self, generation: u64, points: Vec<TimelinePoint>) -> bool {
        let mut buffer = self.write();
        if buffer.phase != TimelinePhase::Live || buffer.generation != generation {
            debug!(event = "timeline_refresh_stale", generation);
            return false;
        }
        buffer.fill(points);
        true
    }

    /// Replaces the whole timeline, e.g. with a loaded sidecar.
    pub fn replace(&self, points: Vec<TimelinePoint>) {
        let mut buffer = self.write();
        buffer.fill(points);
        buffer.phase = TimelinePhase::Settled;
    }

    /// Current phase.
    pub fn phase(&self) -> TimelinePhase {
        self.read().phase
    }

    /// Immutable view of the current points.
    pub fn snapshot(&self) -> TimelineSnapshot {
        let buffer = self.read();
        TimelineSnapshot {
            chunks: buffer.chunks.clone(),
            len: buffer.len,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Buffer> {
        self.buffer.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Buffer> {
        self.buffer.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TimelineAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, immutable timeline view.
///
/// Holds references to the aggregator's chunks; later appends never show up
/// in an existing snapshot.
#[derive(Debug, Clone, Default)]
pub struct TimelineSnapshot {
    chunks: Vec<Chunk>,
    len: usize,
}

impl TimelineSnapshot {
    /// Iterates points in order.
    pub fn iter(&self) -> TimelineIter<'_> {
        TimelineIter {
            chunks: self.chunks.iter(),
            current: Default::default(),
            remaining: self.len,
        }
    }

    /// Point at `index`.
    pub fn get(&self, index: usize) -> Option<&TimelinePoint> {
        self.chunks
            .get(index / CHUNK_LEN)
            .and_then(|chunk| chunk.get(index % CHUNK_LEN))
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for an empty timeline.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Newest point.
    pub fn last(&self) -> Option<&TimelinePoint> {
        self.chunks.last().and_then(|chunk| chunk.last())
    }

    /// Copies the points into one vector.
    pub fn to_vec(&self) -> Vec<TimelinePoint> {
        self.iter().copied().collect()
    }

    /// Sidecar document for the recording at `video_path`.
    pub fn to_sidecar(&self, video_path: impl Into<String>) -> TimelineSidecar {
        TimelineSidecar::new(video_path, &self.to_vec())
    }
}

impl PartialEq for TimelineSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<'a> IntoIterator for &'a TimelineSnapshot {
    type Item = &'a TimelinePoint;
    type IntoIter = TimelineIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`TimelineSnapshot`].
#[derive(Debug, Clone)]
pub struct TimelineIter<'a> {
    chunks: std::slice::Iter<'a, Chunk>,
    current: std::slice::Iter<'a, TimelinePoint>,
    remaining: usize,
}

impl<'a> Iterator for TimelineIter<'a> {
    type Item = &'a TimelinePoint;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(point) = self.current.next() {
                self.remaining -= 1;
                return Some(point);
            }
            self.current = self.chunks.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TimelineIter<'_> {}
