//! Error types and handling
//!
//! Common error types used across the widget.

use crate::capture::CaptureError;
use crate::capture::MediaKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Widget-wide error type
#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("No recorder bound for {0}; enable the stream first")]
    RecorderUnbound(MediaKind),

    #[error("The {0} stream has no live tracks")]
    StreamInactive(MediaKind),

    #[error("No finalized {0} recording available")]
    NoRecording(MediaKind),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<WidgetError> for ErrorResponse {
    fn from(error: WidgetError) -> Self {
        let code = match &error {
            WidgetError::Capture(CaptureError::PermissionDenied(_)) => "PERMISSION_DENIED",
            WidgetError::Capture(CaptureError::DeviceUnavailable(_)) => "DEVICE_UNAVAILABLE",
            WidgetError::Capture(CaptureError::Platform(_)) => "PLATFORM_ERROR",
            WidgetError::RecorderUnbound(_) => "RECORDER_UNBOUND",
            WidgetError::StreamInactive(_) => "STREAM_INACTIVE",
            WidgetError::NoRecording(_) => "NO_RECORDING",
            WidgetError::UnknownResource(_) => "UNKNOWN_RESOURCE",
            WidgetError::Io(_) => "IO_ERROR",
            WidgetError::Serialization(_) => "SERIALIZATION_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using WidgetError
pub type WidgetResult<T> = Result<T, WidgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_maps_to_code() {
        let err = WidgetError::from(CaptureError::PermissionDenied("camera".to_string()));
        let response = ErrorResponse::from(err);
        assert_eq!(response.code, "PERMISSION_DENIED");
        assert!(response.message.contains("camera"));
    }

    #[test]
    fn test_unbound_recorder_names_kind() {
        let response = ErrorResponse::from(WidgetError::RecorderUnbound(MediaKind::Audio));
        assert_eq!(response.code, "RECORDER_UNBOUND");
        assert!(response.message.contains("audio"));
    }

    #[test]
    fn test_inactive_stream_maps_to_code() {
        let response = ErrorResponse::from(WidgetError::StreamInactive(MediaKind::Video));
        assert_eq!(response.code, "STREAM_INACTIVE");
        assert!(response.message.contains("video"));
    }
}
