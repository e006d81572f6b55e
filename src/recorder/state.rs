//! Recording state management
//!
//! The per-kind session record and recording-session timing.

use crate::capture::{MediaRecorder, MediaStream, RecorderState};
use crate::resource::{Blob, FinalizedResource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timing for one start/stop cycle of a recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSession {
    /// Session index for this kind (0, 1, 2, ...)
    pub index: usize,

    /// When recording started
    pub started_at: DateTime<Utc>,

    /// When recording stopped
    pub ended_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    /// Create a new session starting now
    pub fn new(index: usize) -> Self {
        Self {
            index,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// End the session
    pub fn end(&mut self) {
        if self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Elapsed milliseconds, up to now if still running
    pub fn duration_ms(&self) -> u64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }
}

/// A platform recorder together with the generation it was bound under
pub struct BoundRecorder {
    pub generation: u64,
    pub recorder: Box<dyn MediaRecorder>,
}

impl BoundRecorder {
    pub fn state(&self) -> RecorderState {
        self.recorder.state()
    }
}

impl std::fmt::Debug for BoundRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundRecorder")
            .field("generation", &self.generation)
            .field("state", &self.state())
            .finish()
    }
}

/// Everything the widget knows about one media kind
#[derive(Debug, Default)]
pub struct KindSession {
    /// Live stream, while the kind is enabled
    pub stream: Option<MediaStream>,

    /// Recorder bound to `stream`
    pub recorder: Option<BoundRecorder>,

    /// Fragments of the recording in progress, in arrival order
    pub chunks: Vec<Blob>,

    /// Latest finished recording
    pub finalized: Option<FinalizedResource>,

    /// Set on start, cleared on finalization
    pub is_recording: bool,

    /// Timing of the recording in progress
    pub session: Option<RecordingSession>,

    /// Number of recordings started for this kind
    pub sessions_started: usize,
}

impl KindSession {
    pub fn is_enabled(&self) -> bool {
        self.stream.is_some()
    }

    /// Whether the stream is enabled and still has a live track
    pub fn is_active(&self) -> bool {
        self.stream.as_ref().is_some_and(MediaStream::is_active)
    }

    /// Platform state of the bound recorder; `Inactive` when unbound
    pub fn recorder_state(&self) -> RecorderState {
        self.recorder
            .as_ref()
            .map(BoundRecorder::state)
            .unwrap_or_default()
    }

    pub fn generation(&self) -> Option<u64> {
        self.recorder.as_ref().map(|bound| bound.generation)
    }

    /// Bytes buffered for the recording in progress
    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(Blob::size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_end_is_sticky() {
        let mut session = RecordingSession::new(0);
        session.end();
        let first_end = session.ended_at;
        session.end();

        assert_eq!(session.ended_at, first_end);
        assert!(session.ended_at.unwrap() >= session.started_at);
    }

    #[test]
    fn test_empty_kind_session() {
        let session = KindSession::default();
        assert!(!session.is_enabled());
        assert_eq!(session.recorder_state(), RecorderState::Inactive);
        assert_eq!(session.generation(), None);
        assert_eq!(session.buffered_bytes(), 0);
    }
}
