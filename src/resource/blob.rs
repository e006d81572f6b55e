//! Binary blobs and object URLs
//!
//! A `Blob` is an immutable byte range, cheap to clone. The
//! `ObjectUrlRegistry` hands out `blob:` URLs for finalized recordings and
//! resolves them again for playback and download.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::capture::MediaKind;

/// URL scheme prefix for registry URLs
pub const OBJECT_URL_PREFIX: &str = "blob:recording-widget/";

/// Immutable binary data with an optional MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Arc<[u8]>,
    mime_type: Option<String>,
}

impl Blob {
    /// Create an untyped blob, as delivered by a recorder
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::from(data),
            mime_type: None,
        }
    }

    /// Concatenate `parts` in order into a single blob of type `mime_type`
    pub fn concat(parts: &[Blob], mime_type: &str) -> Self {
        let total: usize = parts.iter().map(Blob::size).sum();
        let mut data = Vec::with_capacity(total);
        for part in parts {
            data.extend_from_slice(&part.data);
        }

        Self {
            data: Arc::from(data),
            mime_type: Some(mime_type.to_string()),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// A finished recording, exposed for playback and download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedResource {
    /// Which channel produced it
    pub kind: MediaKind,

    /// Object URL resolvable through the registry
    pub url: String,

    /// MIME type the chunks were tagged with
    pub mime_type: String,

    /// Suggested filename for downloads
    pub filename: String,

    /// Total size in bytes
    pub size: usize,

    /// Number of non-empty chunks that went into it
    pub chunk_count: usize,

    /// Recording duration in milliseconds
    pub duration_ms: u64,

    /// When the recording was finalized
    pub created_at: DateTime<Utc>,
}

/// Registry of live object URLs
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: HashMap<String, Blob>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blob and return a fresh URL for it
    pub fn create_object_url(&mut self, blob: Blob) -> String {
        let url = format!("{}{}", OBJECT_URL_PREFIX, Uuid::new_v4());
        tracing::debug!("Created object URL {} ({} bytes)", url, blob.size());
        self.entries.insert(url.clone(), blob);
        url
    }

    pub fn resolve(&self, url: &str) -> Option<&Blob> {
        self.entries.get(url)
    }

    /// Release a URL. Returns false if it was not registered.
    pub fn revoke_object_url(&mut self, url: &str) -> bool {
        let removed = self.entries.remove(url).is_some();
        if removed {
            tracing::debug!("Revoked object URL {}", url);
        }
        removed
    }

    /// Release every URL
    pub fn revoke_all(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!("Revoking {} object URLs", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_preserves_order_and_type() {
        let parts = vec![Blob::new(vec![1, 2]), Blob::new(Vec::new()), Blob::new(vec![3])];
        let blob = Blob::concat(&parts, "audio/wav");

        assert_eq!(blob.bytes(), &[1, 2, 3]);
        assert_eq!(blob.size(), 3);
        assert_eq!(blob.mime_type(), Some("audio/wav"));
    }

    #[test]
    fn test_concat_of_nothing_is_empty() {
        let blob = Blob::concat(&[], "video/mp4");
        assert!(blob.is_empty());
        assert_eq!(blob.mime_type(), Some("video/mp4"));
    }

    #[test]
    fn test_registry_lifecycle() {
        let mut registry = ObjectUrlRegistry::new();
        let first = registry.create_object_url(Blob::new(vec![0; 4]));
        let second = registry.create_object_url(Blob::new(vec![0; 8]));

        assert_ne!(first, second);
        assert!(first.starts_with(OBJECT_URL_PREFIX));
        assert_eq!(registry.resolve(&second).map(Blob::size), Some(8));

        assert!(registry.revoke_object_url(&first));
        assert!(!registry.revoke_object_url(&first));
        assert!(registry.resolve(&first).is_none());
        assert_eq!(registry.len(), 1);

        registry.revoke_all();
        assert!(registry.is_empty());
    }
}
