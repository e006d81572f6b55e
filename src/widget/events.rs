//! Widget notifications

use crate::capture::MediaKind;
use crate::resource::FinalizedResource;
use serde::{Deserialize, Serialize};

/// Events published by the widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WidgetEvent {
    /// A stream was acquired
    StreamEnabled { kind: MediaKind },
    /// A stream was released
    StreamDisabled { kind: MediaKind },
    /// Recording started
    RecordingStarted { kind: MediaKind },
    /// Recording finished and was finalized
    RecordingStopped { resource: FinalizedResource },
    /// Stream acquisition failed
    Error { kind: MediaKind, message: String },
}
