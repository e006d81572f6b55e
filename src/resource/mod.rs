//! Recorded resources
//!
//! Blob concatenation, object URLs and download targets.

pub mod blob;
pub mod download;

pub use blob::{Blob, FinalizedResource, ObjectUrlRegistry};
pub use download::{DirectorySaveTarget, SaveTarget};
