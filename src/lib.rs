pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod recording;
pub mod storage;
pub mod trim;

pub use capture::{
    acquire, Acquisition, AudioStatus, CaptureBackend, CombinedStream, DeviceHandle, MediaTrack,
    TrackKind, WeakTrack,
};
pub use config::Config;
pub use error::{
    CaptureError, EngineError, RecordingError, StorageError, TrimError, TrimValidationError,
};
pub use http::{create_router, AppState};
pub use recording::{
    Artifact, ElapsedTimer, Encoder, EncoderConfig, EncoderEvent, RecordingSession,
    SegmentAccumulator, SessionConfig, SessionEvent, SessionPhase, SessionState, SessionStatus,
    StartOutcome,
};
pub use storage::{AnalyticsStore, AnalyticsSummary, VideoRecord, VideoStore};
pub use trim::{
    FfmpegEngine, MediaEngine, ReencodeSettings, TrimRequest, TrimStrategy, TrimmedClip, Trimmer,
};
