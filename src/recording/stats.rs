use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::SessionPhase;

/// Snapshot of a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Current state
    pub phase: SessionPhase,

    /// When the current recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Active recording time in whole seconds (paused time excluded)
    pub elapsed_secs: u64,

    /// Number of segments collected so far
    pub segments_count: usize,

    /// Total bytes collected so far
    pub bytes_recorded: usize,

    /// Size of the finalized artifact, once stopped
    pub artifact_bytes: Option<usize>,

    /// Whether the microphone was asked for at start
    pub microphone_requested: bool,

    /// Whether the microphone track is currently enabled
    pub microphone_enabled: bool,

    /// Microphone was requested but unavailable
    pub video_only: bool,

    /// Failure cause, if failed
    pub error: Option<String>,
}
