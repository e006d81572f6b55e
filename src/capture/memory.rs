//! In-memory capture backend
//!
//! Implements the capture traits without touching real devices. Access can be
//! granted or refused per kind, track liveness is observable, and recorded
//! data is injected by the caller with `emit_chunk`. Used by the test suite
//! and as the template for real backends.

use super::kind::{KindMap, MediaKind};
use super::traits::{
    CaptureBackend, CaptureError, CaptureResult, MediaRecorder, MediaStream, MediaTrack,
    RecorderSink, RecorderState, TrackSource,
};
use crate::resource::Blob;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of a stream request for one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceAccess {
    #[default]
    Granted,
    Denied,
    Unavailable,
}

#[derive(Debug)]
struct MemoryTrackSource {
    live: AtomicBool,
}

impl TrackSource for MemoryTrackSource {
    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

struct RecorderCore {
    state: RecorderState,
    sink: RecorderSink,
    deferred_stop: bool,
    stop_pending: bool,
}

#[derive(Default)]
struct MemoryState {
    access: KindMap<DeviceAccess>,
    sources: KindMap<Vec<Arc<MemoryTrackSource>>>,
    recorders: KindMap<Option<Arc<Mutex<RecorderCore>>>>,
    recorders_created: KindMap<usize>,
    deferred_stop: KindMap<bool>,
}

/// Capture backend that lives entirely in process memory
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how the next stream requests for `kind` are answered
    pub fn set_access(&self, kind: MediaKind, access: DeviceAccess) {
        self.state.lock().access[kind] = access;
    }

    /// When set, recorders of `kind` hold back their stop notification
    /// until `flush_stop` is called
    pub fn set_deferred_stop(&self, kind: MediaKind, deferred: bool) {
        self.state.lock().deferred_stop[kind] = deferred;
    }

    /// Number of capture sources of `kind` still producing media
    pub fn live_sources(&self, kind: MediaKind) -> usize {
        self.state.lock().sources[kind]
            .iter()
            .filter(|source| source.is_live())
            .count()
    }

    /// End every capture source of `kind`, as if the device went away
    ///
    /// Returns how many sources were still live.
    pub fn end_sources(&self, kind: MediaKind) -> usize {
        let state = self.state.lock();
        let mut ended = 0;
        for source in state.sources[kind].iter().filter(|source| source.is_live()) {
            source.stop();
            ended += 1;
        }
        ended
    }

    /// Number of recorders ever created for `kind`
    pub fn recorders_created(&self, kind: MediaKind) -> usize {
        self.state.lock().recorders_created[kind]
    }

    /// State of the most recently created recorder of `kind`
    pub fn recorder_state(&self, kind: MediaKind) -> Option<RecorderState> {
        let recorder = self.state.lock().recorders[kind].clone();
        recorder.map(|core| core.lock().state)
    }

    /// Deliver a fragment from the latest recorder of `kind`
    ///
    /// Returns false if that recorder is not recording.
    pub fn emit_chunk(&self, kind: MediaKind, data: Vec<u8>) -> bool {
        let Some(recorder) = self.state.lock().recorders[kind].clone() else {
            return false;
        };

        let core = recorder.lock();
        if core.state != RecorderState::Recording {
            return false;
        }
        core.sink.data_available(Blob::new(data));
        true
    }

    /// Deliver a held-back stop notification. Returns false if none was pending.
    pub fn flush_stop(&self, kind: MediaKind) -> bool {
        let Some(recorder) = self.state.lock().recorders[kind].clone() else {
            return false;
        };

        let mut core = recorder.lock();
        if !core.stop_pending {
            return false;
        }
        core.stop_pending = false;
        core.sink.stopped();
        true
    }
}

#[async_trait]
impl CaptureBackend for MemoryBackend {
    async fn get_user_media(&self, kind: MediaKind) -> CaptureResult<MediaStream> {
        let mut state = self.state.lock();
        match state.access[kind] {
            DeviceAccess::Granted => {}
            DeviceAccess::Denied => {
                return Err(CaptureError::PermissionDenied(format!("{} access refused", kind)));
            }
            DeviceAccess::Unavailable => {
                return Err(CaptureError::DeviceUnavailable(format!("no {} device", kind)));
            }
        }

        let source = Arc::new(MemoryTrackSource {
            live: AtomicBool::new(true),
        });
        state.sources[kind].push(source.clone());

        let label = match kind {
            MediaKind::Video => "memory camera",
            MediaKind::Audio => "memory microphone",
        };
        Ok(MediaStream::new(vec![MediaTrack::new(kind, label, source)]))
    }

    fn create_recorder(
        &self,
        stream: &MediaStream,
        sink: RecorderSink,
    ) -> CaptureResult<Box<dyn MediaRecorder>> {
        if !stream.is_active() {
            return Err(CaptureError::Platform(format!(
                "stream {} has no live tracks",
                stream.id()
            )));
        }

        let kind = sink.kind();
        let mut state = self.state.lock();
        let core = Arc::new(Mutex::new(RecorderCore {
            state: RecorderState::Inactive,
            sink,
            deferred_stop: state.deferred_stop[kind],
            stop_pending: false,
        }));
        state.recorders[kind] = Some(core.clone());
        state.recorders_created[kind] += 1;

        Ok(Box::new(MemoryRecorder { core }))
    }
}

/// Recorder handed out by `MemoryBackend`
pub struct MemoryRecorder {
    core: Arc<Mutex<RecorderCore>>,
}

impl MediaRecorder for MemoryRecorder {
    fn start(&mut self) -> CaptureResult<()> {
        let mut core = self.core.lock();
        if core.state == RecorderState::Recording {
            return Err(CaptureError::Platform("recorder already started".to_string()));
        }
        core.state = RecorderState::Recording;
        Ok(())
    }

    fn stop(&mut self) {
        let mut core = self.core.lock();
        if core.state != RecorderState::Recording {
            return;
        }
        core.state = RecorderState::Inactive;
        if core.deferred_stop {
            core.stop_pending = true;
        } else {
            core.sink.stopped();
        }
    }

    fn state(&self) -> RecorderState {
        self.core.lock().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RecorderNotification;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_denied_kind_yields_no_stream() {
        let backend = MemoryBackend::new();
        backend.set_access(MediaKind::Video, DeviceAccess::Denied);

        let err = backend.get_user_media(MediaKind::Video).await.unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied(_)));
        assert_eq!(backend.live_sources(MediaKind::Video), 0);

        backend.set_access(MediaKind::Video, DeviceAccess::Unavailable);
        let err = backend.get_user_media(MediaKind::Video).await.unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_recorder_emits_chunks_then_stop() {
        let backend = MemoryBackend::new();
        let stream = backend.get_user_media(MediaKind::Audio).await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut recorder = backend
            .create_recorder(&stream, RecorderSink::new(MediaKind::Audio, 1, tx))
            .unwrap();

        assert!(!backend.emit_chunk(MediaKind::Audio, vec![1]));
        recorder.start().unwrap();
        assert!(recorder.start().is_err());
        assert!(backend.emit_chunk(MediaKind::Audio, vec![1, 2]));
        recorder.stop();
        recorder.stop();

        assert!(matches!(
            rx.try_recv().unwrap().notification,
            RecorderNotification::DataAvailable(ref blob) if blob.size() == 2
        ));
        assert!(matches!(rx.try_recv().unwrap().notification, RecorderNotification::Stopped));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deferred_stop_waits_for_flush() {
        let backend = MemoryBackend::new();
        backend.set_deferred_stop(MediaKind::Video, true);
        let stream = backend.get_user_media(MediaKind::Video).await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut recorder = backend
            .create_recorder(&stream, RecorderSink::new(MediaKind::Video, 1, tx))
            .unwrap();

        recorder.start().unwrap();
        recorder.stop();
        assert_eq!(recorder.state(), RecorderState::Inactive);
        assert!(rx.try_recv().is_err());

        assert!(backend.flush_stop(MediaKind::Video));
        assert!(!backend.flush_stop(MediaKind::Video));
        assert!(matches!(rx.try_recv().unwrap().notification, RecorderNotification::Stopped));
    }

    #[tokio::test]
    async fn test_end_sources_deactivates_stream() {
        let backend = MemoryBackend::new();
        let stream = backend.get_user_media(MediaKind::Audio).await.unwrap();
        assert_eq!(stream.tracks()[0].label(), "memory microphone");

        assert_eq!(backend.end_sources(MediaKind::Audio), 1);
        assert_eq!(backend.end_sources(MediaKind::Audio), 0);
        assert!(!stream.is_active());
    }

    #[tokio::test]
    async fn test_released_stream_stops_source() {
        let backend = MemoryBackend::new();
        let stream = backend.get_user_media(MediaKind::Video).await.unwrap();
        assert_eq!(backend.live_sources(MediaKind::Video), 1);

        stream.release();
        assert_eq!(backend.live_sources(MediaKind::Video), 0);
    }
}
