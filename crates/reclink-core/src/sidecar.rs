//! Persisted analytics sidecar (`<recording>.meta.json`).
//!
//! The backend writes the full analytics timeline next to every finished
//! recording. The file is the authoritative source for post-hoc viewing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TimelinePoint;
use crate::wire::TimelinePayload;

/// Sidecar document layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSidecar {
    /// Recording the analytics belong to.
    pub video_path: String,
    /// Timeline entries in emission order.
    pub entries: Vec<TimelinePayload>,
}

impl TimelineSidecar {
    /// Builds a sidecar document from model points.
    pub fn new(video_path: impl Into<String>, points: &[TimelinePoint]) -> Self {
        Self {
            video_path: video_path.into(),
            entries: points.iter().map(TimelinePayload::from).collect(),
        }
    }

    /// Converts entries into model points, preserving order.
    pub fn points(&self) -> Vec<TimelinePoint> {
        self.entries
            .iter()
            .cloned()
            .map(TimelinePoint::from)
            .collect()
    }

    /// Serializes the document to pretty JSON bytes.
    ///
    /// # Errors
    /// Returns [`SidecarError::Codec`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, SidecarError> {
        serde_json::to_vec_pretty(self).map_err(SidecarError::Codec)
    }

    /// Parses a document from JSON bytes.
    ///
    /// # Errors
    /// Returns [`SidecarError::Codec`] when decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, SidecarError> {
        serde_json::from_slice(raw).map_err(SidecarError::Codec)
    }

    /// Reads and parses a sidecar file.
    ///
    /// # Errors
    /// Returns [`SidecarError::Io`] when the file cannot be read and
    /// [`SidecarError::Codec`] when it is not a sidecar document.
    pub fn load(path: &Path) -> Result<Self, SidecarError> {
        let raw = std::fs::read(path).map_err(|source| SidecarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_bytes(&raw)
    }
}

/// Returns the sidecar location for a recording (`a.mkv` -> `a.meta.json`).
pub fn sidecar_path_for(video_path: &Path) -> PathBuf {
    video_path.with_extension("meta.json")
}

/// Sidecar read/parse errors.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// File could not be read.
    #[error("cannot read sidecar {path}: {source}")]
    Io {
        /// Sidecar location.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// File content is not a sidecar document.
    #[error("sidecar codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
