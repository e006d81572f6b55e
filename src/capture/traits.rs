//! Capture trait definitions
//!
//! Platform-agnostic traits for stream acquisition and recording. A backend
//! (browser bindings, a native capture stack, or the in-memory backend)
//! implements these; the widget only ever talks to them.

use super::kind::MediaKind;
use crate::resource::Blob;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Errors raised by a capture backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// The platform side of a single capture track
pub trait TrackSource: Send + Sync {
    /// Stop producing media. Must be idempotent.
    fn stop(&self);

    /// Whether the source is still producing media
    fn is_live(&self) -> bool;
}

struct TrackInner {
    id: Uuid,
    kind: MediaKind,
    label: String,
    source: Arc<dyn TrackSource>,
}

impl Drop for TrackInner {
    fn drop(&mut self) {
        if self.source.is_live() {
            tracing::debug!("Stopping {} track {} ({})", self.kind, self.id, self.label);
            self.source.stop();
        }
    }
}

/// Shared handle to a live capture track
///
/// A track may be carried by more than one stream. The underlying source is
/// stopped once the last handle is dropped.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(kind: MediaKind, label: impl Into<String>, source: Arc<dyn TrackSource>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4(),
                kind,
                label: label.into(),
                source,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_live(&self) -> bool {
        self.inner.source.is_live()
    }

    /// Number of handles (streams) currently holding this track
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl std::fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("label", &self.inner.label)
            .field("live", &self.is_live())
            .finish()
    }
}

/// An ordered set of tracks
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Tracks of one kind, in insertion order
    pub fn tracks_of(&self, kind: MediaKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |track| track.kind() == kind)
    }

    /// First track of `kind`, if any
    pub fn first_track(&self, kind: MediaKind) -> Option<&MediaTrack> {
        self.tracks_of(kind).next()
    }

    /// Attach a track. Adding a track that is already present does nothing.
    pub fn add_track(&mut self, track: MediaTrack) {
        if self.tracks.iter().all(|t| t.id() != track.id()) {
            self.tracks.push(track);
        }
    }

    /// Whether any track is still live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Release every track held by this stream
    ///
    /// Tracks also carried by another stream stay live until that stream
    /// releases them too.
    pub fn release(self) {
        tracing::debug!("Releasing stream {} ({} tracks)", self.id, self.tracks.len());
        drop(self.tracks);
    }
}

/// Platform recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    #[default]
    Inactive,
    Recording,
}

/// A platform recorder bound to one stream
///
/// Recorders report data and stop notifications through the `RecorderSink`
/// they were created with.
pub trait MediaRecorder: Send {
    /// Begin recording
    fn start(&mut self) -> CaptureResult<()>;

    /// Stop recording. The recorder must deliver its stop notification
    /// after every data notification it has already delivered.
    fn stop(&mut self);

    fn state(&self) -> RecorderState;
}

/// Notification payload from a recorder
#[derive(Debug, Clone)]
pub enum RecorderNotification {
    DataAvailable(Blob),
    Stopped,
}

/// A notification tagged with the recorder that sent it
#[derive(Debug, Clone)]
pub struct RecorderEvent {
    pub kind: MediaKind,
    pub generation: u64,
    pub notification: RecorderNotification,
}

/// Delivery handle given to a recorder at construction
#[derive(Debug, Clone)]
pub struct RecorderSink {
    kind: MediaKind,
    generation: u64,
    tx: mpsc::UnboundedSender<RecorderEvent>,
}

impl RecorderSink {
    pub fn new(kind: MediaKind, generation: u64, tx: mpsc::UnboundedSender<RecorderEvent>) -> Self {
        Self { kind, generation, tx }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report a recorded fragment
    pub fn data_available(&self, data: Blob) {
        self.send(RecorderNotification::DataAvailable(data));
    }

    /// Report that recording has stopped
    pub fn stopped(&self) {
        self.send(RecorderNotification::Stopped);
    }

    fn send(&self, notification: RecorderNotification) {
        let event = RecorderEvent {
            kind: self.kind,
            generation: self.generation,
            notification,
        };
        if self.tx.send(event).is_err() {
            tracing::trace!("Widget gone, dropping {} recorder notification", self.kind);
        }
    }
}

/// Platform capture capability
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Request a live stream for `kind`
    async fn get_user_media(&self, kind: MediaKind) -> CaptureResult<MediaStream>;

    /// Construct a recorder over `stream`, reporting through `sink`
    fn create_recorder(
        &self,
        stream: &MediaStream,
        sink: RecorderSink,
    ) -> CaptureResult<Box<dyn MediaRecorder>>;
}
