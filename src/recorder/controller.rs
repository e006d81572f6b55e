//! Recorder controller
//!
//! Binds platform recorders to streams, buffers their fragments and turns a
//! stop notification into a finalized resource. Recorder notifications are
//! queued on one channel and applied to the session record when drained, so
//! finalization always reads the buffer as it is at that moment.

use super::state::{BoundRecorder, KindSession, RecordingSession};
use crate::capture::{
    CaptureBackend, CaptureResult, MediaKind, MediaStream, RecorderEvent, RecorderNotification,
    RecorderSink, RecorderState,
};
use crate::config::KindConfig;
use crate::resource::{Blob, FinalizedResource, ObjectUrlRegistry};
use crate::utils::{WidgetError, WidgetResult};
use chrono::Utc;
use tokio::sync::mpsc;

/// Queue of notifications from every recorder the widget has bound
#[derive(Debug)]
pub struct RecorderEvents {
    tx: mpsc::UnboundedSender<RecorderEvent>,
    rx: mpsc::UnboundedReceiver<RecorderEvent>,
    next_generation: u64,
}

impl RecorderEvents {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            next_generation: 1,
        }
    }

    /// Sink for a new recorder of `kind`, under a fresh generation
    pub fn sink(&mut self, kind: MediaKind) -> RecorderSink {
        let generation = self.next_generation;
        self.next_generation += 1;
        RecorderSink::new(kind, generation, self.tx.clone())
    }

    /// Next queued notification, without waiting
    pub fn try_next(&mut self) -> Option<RecorderEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next notification
    pub async fn next(&mut self) -> Option<RecorderEvent> {
        self.rx.recv().await
    }
}

impl Default for RecorderEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of applying one recorder notification
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A fragment was buffered
    Buffered(usize),
    /// The recording was finalized
    Finalized(FinalizedResource),
    /// Nothing changed
    Ignored,
}

impl KindSession {
    /// Construct a recorder over `stream`, replacing any previous one
    pub fn bind_recorder<B>(
        &mut self,
        kind: MediaKind,
        stream: &MediaStream,
        backend: &B,
        events: &mut RecorderEvents,
    ) -> CaptureResult<u64>
    where
        B: CaptureBackend + ?Sized,
    {
        let sink = events.sink(kind);
        let generation = sink.generation();
        let recorder = backend.create_recorder(stream, sink)?;

        if let Some(previous) = self.recorder.replace(BoundRecorder { generation, recorder }) {
            tracing::debug!(
                "Replaced {} recorder generation {} with {}",
                kind,
                previous.generation,
                generation
            );
        }

        tracing::info!("Bound {} recorder to stream {} (generation {})", kind, stream.id(), generation);
        Ok(generation)
    }

    /// Begin a recording
    ///
    /// Starting while already recording is a no-op. A stream whose tracks
    /// have all ended cannot be recorded.
    pub fn start(&mut self, kind: MediaKind) -> WidgetResult<()> {
        if self.stream.is_none() || self.recorder.is_none() {
            return Err(WidgetError::RecorderUnbound(kind));
        }
        if !self.is_recording && !self.is_active() {
            tracing::warn!("Refusing to start {} recording on an ended stream", kind);
            return Err(WidgetError::StreamInactive(kind));
        }
        let Some(bound) = self.recorder.as_mut() else {
            return Err(WidgetError::RecorderUnbound(kind));
        };

        if self.is_recording || bound.state() == RecorderState::Recording {
            tracing::debug!("{} recording already in progress", kind);
            return Ok(());
        }

        self.chunks.clear();
        bound.recorder.start()?;

        self.is_recording = true;
        self.session = Some(RecordingSession::new(self.sessions_started));
        self.sessions_started += 1;

        tracing::info!("Started {} recording", kind);
        Ok(())
    }

    /// Ask the recorder to stop
    ///
    /// Returns false, changing nothing, when no recorder is recording.
    pub fn stop(&mut self, kind: MediaKind) -> bool {
        match self.recorder.as_mut() {
            Some(bound) if bound.state() == RecorderState::Recording => {
                bound.recorder.stop();
                tracing::info!("Stopped {} recording", kind);
                true
            }
            _ => false,
        }
    }

    /// Buffer a fragment. Empty fragments are dropped.
    pub fn append_chunk(&mut self, kind: MediaKind, data: Blob) -> bool {
        if data.is_empty() {
            tracing::trace!("Dropping empty {} chunk", kind);
            return false;
        }

        tracing::debug!("Buffered {} chunk of {} bytes", kind, data.size());
        self.chunks.push(data);
        true
    }

    /// Concatenate the buffered fragments into the kind's finalized resource
    ///
    /// The previous finalized resource is superseded and its URL revoked.
    pub fn finalize(
        &mut self,
        kind: MediaKind,
        config: &KindConfig,
        registry: &mut ObjectUrlRegistry,
    ) -> FinalizedResource {
        let chunks = std::mem::take(&mut self.chunks);
        let blob = Blob::concat(&chunks, &config.mime_type);

        let duration_ms = match self.session.take() {
            Some(mut session) => {
                session.end();
                session.duration_ms()
            }
            None => 0,
        };

        let resource = FinalizedResource {
            kind,
            mime_type: config.mime_type.clone(),
            filename: config.download_filename.clone(),
            size: blob.size(),
            chunk_count: chunks.len(),
            duration_ms,
            created_at: Utc::now(),
            url: registry.create_object_url(blob),
        };

        if let Some(previous) = self.finalized.replace(resource.clone()) {
            registry.revoke_object_url(&previous.url);
        }
        self.is_recording = false;

        tracing::info!(
            "Finalized {} recording: {} bytes from {} chunks, {}ms",
            kind,
            resource.size,
            resource.chunk_count,
            resource.duration_ms
        );
        resource
    }

    /// Apply a recorder notification to this session
    ///
    /// Notifications from a recorder that is no longer bound are dropped.
    pub fn apply(
        &mut self,
        event: RecorderEvent,
        config: &KindConfig,
        registry: &mut ObjectUrlRegistry,
    ) -> Applied {
        if self.generation() != Some(event.generation) {
            tracing::warn!(
                "Dropping notification from retired {} recorder (generation {})",
                event.kind,
                event.generation
            );
            return Applied::Ignored;
        }

        match event.notification {
            RecorderNotification::DataAvailable(data) => {
                let size = data.size();
                if self.append_chunk(event.kind, data) {
                    Applied::Buffered(size)
                } else {
                    Applied::Ignored
                }
            }
            RecorderNotification::Stopped if self.is_recording => {
                Applied::Finalized(self.finalize(event.kind, config, registry))
            }
            RecorderNotification::Stopped => {
                tracing::debug!("Ignoring {} stop with no recording in progress", event.kind);
                Applied::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MemoryBackend;

    const KIND: MediaKind = MediaKind::Video;

    async fn bound_session(backend: &MemoryBackend, events: &mut RecorderEvents) -> KindSession {
        let stream = backend.get_user_media(KIND).await.unwrap();
        let mut session = KindSession::default();
        session.bind_recorder(KIND, &stream, backend, events).unwrap();
        session.stream = Some(stream);
        session
    }

    fn drain(session: &mut KindSession, events: &mut RecorderEvents, registry: &mut ObjectUrlRegistry) -> Vec<Applied> {
        let config = KindConfig::default_for(KIND);
        let mut applied = Vec::new();
        while let Some(event) = events.try_next() {
            applied.push(session.apply(event, &config, registry));
        }
        applied
    }

    #[test]
    fn test_start_without_recorder_is_unbound() {
        let mut session = KindSession::default();
        assert!(matches!(session.start(KIND), Err(WidgetError::RecorderUnbound(MediaKind::Video))));
        assert!(!session.is_recording);
    }

    #[tokio::test]
    async fn test_start_on_ended_stream_is_refused() {
        let backend = MemoryBackend::new();
        let mut events = RecorderEvents::new();
        let mut session = bound_session(&backend, &mut events).await;

        backend.end_sources(KIND);
        assert!(!session.is_active());
        assert!(matches!(session.start(KIND), Err(WidgetError::StreamInactive(MediaKind::Video))));
        assert!(!session.is_recording);
        assert!(session.session.is_none());
        assert!(events.try_next().is_none());
    }

    #[tokio::test]
    async fn test_stop_reads_current_buffer() {
        let backend = MemoryBackend::new();
        let mut events = RecorderEvents::new();
        let mut registry = ObjectUrlRegistry::new();
        let mut session = bound_session(&backend, &mut events).await;

        session.start(KIND).unwrap();
        backend.emit_chunk(KIND, vec![1; 10]);
        backend.emit_chunk(KIND, Vec::new());
        backend.emit_chunk(KIND, vec![2; 20]);
        assert!(session.stop(KIND));

        let applied = drain(&mut session, &mut events, &mut registry);
        assert_eq!(applied.len(), 4);
        let Some(Applied::Finalized(resource)) = applied.last() else {
            panic!("expected finalization, got {:?}", applied);
        };

        assert_eq!(resource.size, 30);
        assert_eq!(resource.chunk_count, 2);
        assert_eq!(resource.mime_type, "video/mp4");
        assert!(!session.is_recording);
        assert!(session.chunks.is_empty());

        let blob = registry.resolve(&resource.url).unwrap();
        let mut expected: Vec<u8> = vec![1; 10];
        expected.extend(vec![2; 20]);
        assert_eq!(blob.bytes(), expected.as_slice());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let backend = MemoryBackend::new();
        let mut events = RecorderEvents::new();
        let mut registry = ObjectUrlRegistry::new();
        let mut session = bound_session(&backend, &mut events).await;

        assert!(!session.stop(KIND));
        assert!(drain(&mut session, &mut events, &mut registry).is_empty());
        assert!(session.finalized.is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_second_recording_supersedes_first() {
        let backend = MemoryBackend::new();
        let mut events = RecorderEvents::new();
        let mut registry = ObjectUrlRegistry::new();
        let mut session = bound_session(&backend, &mut events).await;

        session.start(KIND).unwrap();
        backend.emit_chunk(KIND, vec![1; 4]);
        session.stop(KIND);
        drain(&mut session, &mut events, &mut registry);
        let first_url = session.finalized.as_ref().unwrap().url.clone();

        session.start(KIND).unwrap();
        backend.emit_chunk(KIND, vec![2; 6]);
        session.stop(KIND);
        drain(&mut session, &mut events, &mut registry);

        let second = session.finalized.as_ref().unwrap();
        assert_ne!(second.url, first_url);
        assert_eq!(second.size, 6);
        assert!(registry.resolve(&first_url).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(session.sessions_started, 2);
    }

    #[tokio::test]
    async fn test_retired_generation_is_ignored() {
        let backend = MemoryBackend::new();
        let mut events = RecorderEvents::new();
        let mut registry = ObjectUrlRegistry::new();
        let mut session = bound_session(&backend, &mut events).await;

        session.start(KIND).unwrap();
        let stale = session.generation().unwrap();
        session.recorder = None;

        let config = KindConfig::default_for(KIND);
        let event = RecorderEvent {
            kind: KIND,
            generation: stale,
            notification: RecorderNotification::DataAvailable(Blob::new(vec![9])),
        };
        assert_eq!(session.apply(event, &config, &mut registry), Applied::Ignored);
        assert!(session.chunks.is_empty());
    }
}
