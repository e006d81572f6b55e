//! Recording Widget - record short camera and microphone clips.
//!
//! This is the main library crate. It provides the recording widget state
//! machine, the capture traits a platform backend implements, and an
//! in-memory backend.

pub mod capture;
pub mod config;
pub mod recorder;
pub mod resource;
pub mod utils;
pub mod widget;

pub use capture::{CaptureBackend, MediaKind, MemoryBackend};
pub use config::WidgetConfig;
pub use resource::{DirectorySaveTarget, FinalizedResource, SaveTarget};
pub use utils::{WidgetError, WidgetResult};
pub use widget::{ControlState, RecordingWidget, WidgetEvent};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
///
/// Honors `RUST_LOG`; defaults to debug output for this crate. Calling it
/// again once a subscriber is installed does nothing.
pub fn init_tracing() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recording_widget=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Starting recording widget v{}", env!("CARGO_PKG_VERSION"));
    }
}
