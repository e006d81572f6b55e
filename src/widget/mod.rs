//! Recording widget
//!
//! Owns one session record per media kind and sequences the platform calls
//! behind the widget's controls:
//! - enabling/disabling the camera and microphone streams
//! - starting and stopping recordings
//! - exposing finalized recordings for playback and download

pub mod controls;
pub mod events;

pub use controls::{ControlState, KindSnapshot, WidgetSnapshot};
pub use events::WidgetEvent;

use crate::capture::{CaptureBackend, KindMap, MediaKind, MediaStream};
use crate::config::WidgetConfig;
use crate::recorder::{Applied, KindSession, RecorderEvents};
use crate::resource::{Blob, FinalizedResource, ObjectUrlRegistry, SaveTarget};
use crate::utils::{WidgetError, WidgetResult};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;

/// Camera/microphone recording widget
pub struct RecordingWidget<B: CaptureBackend> {
    /// Platform capture capability
    backend: B,

    config: WidgetConfig,

    /// Per-kind session records
    sessions: KindMap<KindSession>,

    /// Notifications from bound recorders
    events: RecorderEvents,

    /// Object URLs of finalized recordings
    registry: ObjectUrlRegistry,

    /// Event broadcaster
    event_tx: broadcast::Sender<WidgetEvent>,
}

impl<B: CaptureBackend> RecordingWidget<B> {
    /// Create a widget with default settings
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, WidgetConfig::default())
    }

    pub fn with_config(backend: B, config: WidgetConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            backend,
            config,
            sessions: KindMap::default(),
            events: RecorderEvents::new(),
            registry: ObjectUrlRegistry::new(),
            event_tx,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Subscribe to widget events
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: WidgetEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Acquire a live stream for `kind` and bind a recorder to it
    ///
    /// If the other kind is enabled, its track is carried by the new stream
    /// as well. On failure the kind stays disabled.
    pub async fn enable_stream(&mut self, kind: MediaKind) -> WidgetResult<()> {
        if self.sessions[kind].is_enabled() {
            tracing::info!("Replacing active {} stream", kind);
            self.disable_stream(kind);
        }

        let mut stream = match self.backend.get_user_media(kind).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Error accessing {}: {}", kind, e);
                self.emit(WidgetEvent::Error {
                    kind,
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let other = kind.other();
        let shared = self.sessions[other]
            .stream
            .as_ref()
            .and_then(|s| s.first_track(other))
            .cloned();
        if let Some(track) = shared {
            tracing::debug!(
                "Attaching {} track {} ({}) to new {} stream",
                other,
                track.id(),
                track.label(),
                kind
            );
            stream.add_track(track);
        }

        let session = &mut self.sessions[kind];
        if let Err(e) = session.bind_recorder(kind, &stream, &self.backend, &mut self.events) {
            tracing::error!("Could not create {} recorder: {}", kind, e);
            stream.release();
            self.emit(WidgetEvent::Error {
                kind,
                message: e.to_string(),
            });
            return Err(e.into());
        }
        session.stream = Some(stream);

        tracing::info!("{} permission granted", kind);
        self.emit(WidgetEvent::StreamEnabled { kind });
        Ok(())
    }

    /// Release the stream for `kind`, finishing any recording in progress
    ///
    /// Disabling a disabled kind does nothing.
    pub fn disable_stream(&mut self, kind: MediaKind) {
        if !self.sessions[kind].is_enabled() {
            tracing::debug!("{} stream already disabled", kind);
            return;
        }

        if self.sessions[kind].is_recording {
            self.sessions[kind].stop(kind);
            self.process_events();

            if self.sessions[kind].is_recording {
                self.force_finalize(kind);
            }
        }

        let session = &mut self.sessions[kind];
        session.recorder = None;
        if let Some(stream) = session.stream.take() {
            stream.release();
        }

        tracing::info!("Disabled {} stream", kind);
        self.emit(WidgetEvent::StreamDisabled { kind });
    }

    /// Start recording `kind`
    ///
    /// Fails with `RecorderUnbound` if the stream is not enabled.
    pub fn start(&mut self, kind: MediaKind) -> WidgetResult<()> {
        let was_recording = self.sessions[kind].is_recording;
        self.sessions[kind].start(kind)?;

        if !was_recording && self.sessions[kind].is_recording {
            self.emit(WidgetEvent::RecordingStarted { kind });
        }
        Ok(())
    }

    /// Stop recording `kind`
    ///
    /// The recording is finalized once the recorder's stop notification is
    /// processed. Returns false when nothing was recording.
    pub fn stop(&mut self, kind: MediaKind) -> bool {
        self.sessions[kind].stop(kind)
    }

    /// Apply every queued recorder notification, returning how many there were
    pub fn process_events(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.events.try_next() {
            self.dispatch(event);
            processed += 1;
        }
        processed
    }

    /// Wait for the next recorder notification and apply it
    pub async fn next_event(&mut self) -> Applied {
        match self.events.next().await {
            Some(event) => self.dispatch(event),
            None => Applied::Ignored,
        }
    }

    fn dispatch(&mut self, event: crate::capture::RecorderEvent) -> Applied {
        let kind = event.kind;
        let applied = self.sessions[kind].apply(event, self.config.for_kind(kind), &mut self.registry);

        if let Applied::Finalized(resource) = &applied {
            self.emit(WidgetEvent::RecordingStopped {
                resource: resource.clone(),
            });
        }
        applied
    }

    /// Finalize what is buffered without waiting for the recorder
    fn force_finalize(&mut self, kind: MediaKind) -> FinalizedResource {
        tracing::warn!("{} recorder has not reported stop, finalizing buffered data", kind);
        let resource =
            self.sessions[kind].finalize(kind, self.config.for_kind(kind), &mut self.registry);
        self.emit(WidgetEvent::RecordingStopped {
            resource: resource.clone(),
        });
        resource
    }

    /// Bind a fresh recorder to the kind's current stream so notifications
    /// from the old one are dropped
    fn rebind_recorder(&mut self, kind: MediaKind) {
        let Some(stream) = self.sessions[kind].stream.clone() else {
            return;
        };
        let session = &mut self.sessions[kind];
        if let Err(e) = session.bind_recorder(kind, &stream, &self.backend, &mut self.events) {
            tracing::warn!("Could not rebind {} recorder: {}", kind, e);
            session.recorder = None;
        }
    }

    /// Stop `kind` and wait until the recording is finalized
    ///
    /// Waits at most `stop_timeout_ms` for the recorder's stop notification;
    /// after that the buffered fragments are finalized and the recorder is
    /// replaced. Returns `None` if nothing was recording.
    pub async fn finish_recording(&mut self, kind: MediaKind) -> Option<FinalizedResource> {
        if !self.sessions[kind].is_recording {
            return None;
        }

        self.stop(kind);
        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.config.stop_timeout_ms);

        while self.sessions[kind].is_recording {
            if tokio::time::timeout_at(deadline, self.next_event()).await.is_err() {
                self.process_events();
                if self.sessions[kind].is_recording {
                    self.force_finalize(kind);
                    self.rebind_recorder(kind);
                }
            }
        }
        self.sessions[kind].finalized.clone()
    }

    /// Current control availability for `kind`
    pub fn controls(&self, kind: MediaKind) -> ControlState {
        ControlState::derive(&self.sessions[kind])
    }

    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        self.sessions[kind].is_enabled()
    }

    pub fn is_recording(&self, kind: MediaKind) -> bool {
        self.sessions[kind].is_recording
    }

    /// Live stream for the preview element
    pub fn preview(&self, kind: MediaKind) -> Option<&MediaStream> {
        self.sessions[kind].stream.as_ref()
    }

    /// Latest finalized recording for the playback element
    pub fn playback(&self, kind: MediaKind) -> Option<&FinalizedResource> {
        self.sessions[kind].finalized.as_ref()
    }

    /// Read-only access to a kind's session record
    pub fn session(&self, kind: MediaKind) -> &KindSession {
        &self.sessions[kind]
    }

    /// Look up the data behind an object URL
    pub fn resolve(&self, url: &str) -> Option<&Blob> {
        self.registry.resolve(url)
    }

    /// Save the finalized recording of `kind` and open it for preview
    pub fn download(&self, kind: MediaKind, target: &dyn SaveTarget) -> WidgetResult<PathBuf> {
        let resource = self.sessions[kind]
            .finalized
            .as_ref()
            .ok_or(WidgetError::NoRecording(kind))?;
        let blob = self
            .registry
            .resolve(&resource.url)
            .ok_or_else(|| WidgetError::UnknownResource(resource.url.clone()))?;

        let path = target.save(&resource.filename, blob)?;
        target.open(resource)?;

        tracing::info!("Downloaded {} recording to {:?}", kind, path);
        Ok(path)
    }

    /// Serializable view of both kinds
    pub fn snapshot(&self) -> WidgetSnapshot {
        KindMap::from_fn(|kind| KindSnapshot::of(&self.sessions[kind]))
    }

    /// Disable both kinds and revoke every object URL
    pub fn shutdown(&mut self) {
        for kind in MediaKind::ALL {
            self.disable_stream(kind);
        }
        for kind in MediaKind::ALL {
            self.sessions[kind].finalized = None;
        }
        self.registry.revoke_all();
        tracing::info!("Recording widget shut down");
    }
}
