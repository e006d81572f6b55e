//! Media kinds
//!
//! The widget handles two media channels symmetrically. `KindMap` holds one
//! value per kind so per-kind state never has to be looked up by string.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two capture channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Camera
    Video,
    /// Microphone
    Audio,
}

impl MediaKind {
    /// Both kinds, video first
    pub const ALL: [MediaKind; 2] = [MediaKind::Video, MediaKind::Audio];

    /// The opposite kind
    pub fn other(self) -> Self {
        match self {
            MediaKind::Video => MediaKind::Audio,
            MediaKind::Audio => MediaKind::Video,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// A value for each media kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindMap<T> {
    pub video: T,
    pub audio: T,
}

impl<T> KindMap<T> {
    /// Build a map by evaluating `f` for each kind
    pub fn from_fn(mut f: impl FnMut(MediaKind) -> T) -> Self {
        Self {
            video: f(MediaKind::Video),
            audio: f(MediaKind::Audio),
        }
    }

    pub fn get(&self, kind: MediaKind) -> &T {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }

    pub fn get_mut(&mut self, kind: MediaKind) -> &mut T {
        match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
        }
    }

    /// Iterate `(kind, value)` pairs, video first
    pub fn iter(&self) -> impl Iterator<Item = (MediaKind, &T)> {
        MediaKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

impl<T> Index<MediaKind> for KindMap<T> {
    type Output = T;

    fn index(&self, kind: MediaKind) -> &T {
        self.get(kind)
    }
}

impl<T> IndexMut<MediaKind> for KindMap<T> {
    fn index_mut(&mut self, kind: MediaKind) -> &mut T {
        self.get_mut(kind)
    }
}
