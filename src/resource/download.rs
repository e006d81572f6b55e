//! Download targets
//!
//! A `SaveTarget` is the host's "save to disk and open for preview" primitive.

use super::blob::{Blob, FinalizedResource};
use crate::utils::WidgetResult;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

/// Host primitive for saving and opening finalized recordings
pub trait SaveTarget {
    /// Persist `blob` under `filename`, returning where it landed
    fn save(&self, filename: &str, blob: &Blob) -> WidgetResult<PathBuf>;

    /// Open the resource for preview in a new context
    fn open(&self, resource: &FinalizedResource) -> WidgetResult<()>;
}

/// Saves downloads into a directory
///
/// Opened resources are recorded rather than launched; a desktop host can
/// wrap this to hand the saved path to its viewer.
#[derive(Debug)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
    opened: Mutex<Vec<String>>,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// URLs opened so far, oldest first
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&self, filename: &str, blob: &Blob) -> WidgetResult<PathBuf> {
        fs::create_dir_all(self.dir())?;

        let path = self.dir().join(filename);
        fs::write(&path, blob.bytes())?;

        tracing::info!("Saved {} bytes to {:?} in {:?}", blob.size(), filename, self.dir());
        Ok(path)
    }

    fn open(&self, resource: &FinalizedResource) -> WidgetResult<()> {
        tracing::info!("Opening {} for preview", resource.url);
        self.opened.lock().push(resource.url.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MediaKind;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let target = DirectorySaveTarget::new(dir.path().join("downloads"));
        assert_eq!(target.dir(), dir.path().join("downloads"));

        let path = target.save("recorded_video.mp4", &Blob::new(vec![7; 5])).unwrap();

        assert_eq!(path, dir.path().join("downloads").join("recorded_video.mp4"));
        assert_eq!(fs::read(&path).unwrap(), vec![7; 5]);
    }

    #[test]
    fn test_open_is_recorded() {
        let dir = tempdir().unwrap();
        let target = DirectorySaveTarget::new(dir.path());
        let resource = FinalizedResource {
            kind: MediaKind::Audio,
            url: "blob:recording-widget/abc".to_string(),
            mime_type: "audio/wav".to_string(),
            filename: "recorded_audio.wav".to_string(),
            size: 0,
            chunk_count: 0,
            duration_ms: 0,
            created_at: Utc::now(),
        };

        target.open(&resource).unwrap();
        assert_eq!(target.opened(), vec!["blob:recording-widget/abc".to_string()]);
    }
}
