//! Error taxonomy shared across the crate
//!
//! - `CaptureError`: device access for the display / microphone
//! - `RecordingError`: cause carried by a `Failed` recording session
//! - `TrimError`: validation or engine failure while trimming
//! - `StorageError`: persistence failures on the server side

use std::path::PathBuf;
use thiserror::Error;

/// Failure while acquiring a capture device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Cause of a recording session entering `Failed`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    #[error("Screen capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Encoder did not acknowledge the final flush within {0} ms")]
    FlushTimeout(u64),
}

/// Trim input rejected before any engine resource is allocated.
///
/// Variants are listed in the order they are checked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrimValidationError {
    #[error("Start and end times must be finite numbers")]
    NonFiniteTime,

    #[error("Start time cannot be negative")]
    NegativeStart,

    #[error("End time ({end:.2}s) cannot exceed the video duration ({duration:.2}s)")]
    EndBeyondDuration { end: f64, duration: f64 },

    #[error("Start time must be less than end time")]
    StartNotBeforeEnd,

    #[error("Trimmed clip must be at least {min:.1}s long")]
    RangeTooShort { min: f64 },
}

/// Failure inside the external media-processing engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to initialise media engine: {0}")]
    Init(String),

    #[error("Media engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media engine command failed: {0}")]
    Execution(String),

    #[error("Media engine produced an empty output")]
    EmptyOutput,

    #[error("Media engine call was cancelled")]
    Cancelled,
}

/// Failure of a trim request
#[derive(Error, Debug)]
pub enum TrimError {
    #[error(transparent)]
    Validation(#[from] TrimValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Failure of the server-side video / analytics stores
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Video {0} not found")]
    NotFound(String),

    #[error("Invalid video id: {0}")]
    InvalidId(String),

    #[error("Storage I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analytics file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_wraps_into_recording_error() {
        let err: RecordingError = CaptureError::PermissionDenied("display".to_string()).into();
        assert_eq!(err.to_string(), "Screen capture failed: Permission denied: display");
    }

    #[test]
    fn test_validation_error_is_transparent_through_trim_error() {
        let err: TrimError = TrimValidationError::StartNotBeforeEnd.into();
        assert_eq!(err.to_string(), "Start time must be less than end time");
    }
}
