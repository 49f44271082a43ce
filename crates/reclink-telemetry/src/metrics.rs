use std::sync::{PoisonError, RwLock};

use reclink_core::MetricsSample;
use tracing::debug;

/// Latest metrics sample. Older samples are discarded.
#[derive(Debug, Default)]
pub struct MetricsGauge {
    latest: RwLock<MetricsSample>,
}

impl MetricsGauge {
    /// Creates an empty gauge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current sample.
    pub fn on_sample(&self, sample: MetricsSample) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        if sample.dropped_frames < latest.dropped_frames {
            // Counter went backwards; the sample is still shown as-is.
            debug!(
                event = "dropped_frames_decreased",
                previous = latest.dropped_frames,
                current = sample.dropped_frames
            );
        }
        *latest = sample;
    }

    /// Most recent sample; all zeros before the first sample or after a
    /// reset.
    pub fn latest(&self) -> MetricsSample {
        *self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restores the zero sample.
    pub fn reset(&self) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = MetricsSample::default();
    }
}
