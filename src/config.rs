//! Widget configuration
//!
//! Per-kind MIME types and download filenames, loadable from JSON.

use crate::capture::{KindMap, MediaKind};
use crate::utils::WidgetResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for one media kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindConfig {
    /// MIME type finalized recordings are tagged with
    pub mime_type: String,

    /// Filename used when downloading
    pub download_filename: String,
}

impl KindConfig {
    pub fn default_for(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => Self {
                mime_type: "video/mp4".to_string(),
                download_filename: "recorded_video.mp4".to_string(),
            },
            MediaKind::Audio => Self {
                mime_type: "audio/wav".to_string(),
                download_filename: "recorded_audio.wav".to_string(),
            },
        }
    }
}

/// Widget settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub video: KindConfig,

    pub audio: KindConfig,

    /// Capacity of the widget event broadcast channel
    pub event_capacity: usize,

    /// How long `finish_recording` waits for a recorder's stop notification
    /// before finalizing what is buffered
    pub stop_timeout_ms: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            video: KindConfig::default_for(MediaKind::Video),
            audio: KindConfig::default_for(MediaKind::Audio),
            event_capacity: 100,
            stop_timeout_ms: 2000,
        }
    }
}

impl WidgetConfig {
    pub fn for_kind(&self, kind: MediaKind) -> &KindConfig {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }

    /// Per-kind settings as a `KindMap`
    pub fn kinds(&self) -> KindMap<KindConfig> {
        KindMap::from_fn(|kind| self.for_kind(kind).clone())
    }

    /// Read a config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> WidgetResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: WidgetConfig = serde_json::from_str(&content)?;

        tracing::debug!("Loaded widget config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> WidgetResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
