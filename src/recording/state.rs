use serde::{Deserialize, Serialize};
use std::fmt;

use super::segments::Artifact;
use crate::error::RecordingError;

/// Data-free view of the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Acquiring,
    Recording,
    Paused,
    Stopping,
    Stopped,
    Failed,
}

impl SessionPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    /// A stream is held and the user can pause, resume, stop or toggle the microphone
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recording session state.
///
/// ```text
///   Idle --start--> Acquiring --ok--> Recording <--pause/resume--> Paused
///   Acquiring --fail--> Failed
///   Recording|Paused --stop / device end--> Stopping --flushed--> Stopped(artifact)
///   Recording|Paused|Stopping --encoder error--> Failed
///   any --reset--> Idle
/// ```
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Acquiring,
    Recording,
    Paused,
    Stopping,
    Stopped(Artifact),
    Failed(RecordingError),
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle => SessionPhase::Idle,
            Self::Acquiring => SessionPhase::Acquiring,
            Self::Recording => SessionPhase::Recording,
            Self::Paused => SessionPhase::Paused,
            Self::Stopping => SessionPhase::Stopping,
            Self::Stopped(_) => SessionPhase::Stopped,
            Self::Failed(_) => SessionPhase::Failed,
        }
    }
}
