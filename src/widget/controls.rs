//! UI state reflection
//!
//! Control availability is derived from the session record on every call and
//! never stored separately.

use crate::capture::{KindMap, RecorderState};
use crate::recorder::KindSession;
use crate::resource::FinalizedResource;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which controls of one kind are available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    /// Start button enabled
    pub start_enabled: bool,

    /// Stop button enabled
    pub stop_enabled: bool,

    /// Download button shown
    pub download_available: bool,

    /// Live preview shown
    pub preview: bool,

    /// Playback element shown
    pub playback: bool,
}

impl ControlState {
    pub fn derive(session: &KindSession) -> Self {
        let enabled = session.is_enabled();
        let active = session.is_active();
        let has_recording = session.finalized.is_some();

        Self {
            // A stop issued but not yet finalized keeps start disabled, so a new
            // recording cannot clear the buffer before it is concatenated.
            start_enabled: active
                && session.recorder_state() == RecorderState::Inactive
                && !session.is_recording,
            stop_enabled: session.is_recording,
            download_available: has_recording,
            preview: enabled,
            playback: has_recording,
        }
    }
}

/// Serializable view of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSnapshot {
    pub controls: ControlState,
    pub stream_id: Option<Uuid>,
    pub track_count: usize,
    pub recorder_state: RecorderState,
    pub is_recording: bool,
    pub buffered_chunks: usize,
    pub buffered_bytes: usize,
    pub finalized: Option<FinalizedResource>,
}

impl KindSnapshot {
    pub fn of(session: &KindSession) -> Self {
        Self {
            controls: ControlState::derive(session),
            stream_id: session.stream.as_ref().map(|stream| stream.id()),
            track_count: session
                .stream
                .as_ref()
                .map(|stream| stream.tracks().len())
                .unwrap_or(0),
            recorder_state: session.recorder_state(),
            is_recording: session.is_recording,
            buffered_chunks: session.chunks.len(),
            buffered_bytes: session.buffered_bytes(),
            finalized: session.finalized.clone(),
        }
    }
}

/// Serializable view of the whole widget
pub type WidgetSnapshot = KindMap<KindSnapshot>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_kind_has_no_controls() {
        let controls = ControlState::derive(&KindSession::default());
        assert_eq!(controls, ControlState::default());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = KindSnapshot::of(&KindSession::default());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["recorderState"], "inactive");
        assert_eq!(json["controls"]["startEnabled"], false);
        assert!(json["finalized"].is_null());
    }
}
