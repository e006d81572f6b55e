//! Capture layer
//!
//! Media kinds, streams and tracks, and the traits a platform backend
//! implements to provide stream acquisition and recording.

pub mod kind;
pub mod memory;
pub mod traits;

pub use kind::{KindMap, MediaKind};
pub use memory::{DeviceAccess, MemoryBackend};
pub use traits::{
    CaptureBackend, CaptureError, CaptureResult, MediaRecorder, MediaStream, MediaTrack,
    RecorderEvent, RecorderNotification, RecorderSink, RecorderState, TrackSource,
};
