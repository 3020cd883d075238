use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::encoder::EncoderConfig;

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Media type of the recorded artifact
    /// Default: "video/webm"
    pub mime_type: String,

    /// How often the encoder emits a segment
    /// Default: 1 second
    pub timeslice: Duration,

    /// Upper bound on waiting for the encoder's final flush after stop
    /// Default: 5 seconds
    pub flush_timeout: Duration,
}

impl SessionConfig {
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            mime_type: self.mime_type.clone(),
            timeslice: self.timeslice,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mime_type: "video/webm".to_string(),
            timeslice: Duration::from_secs(1),
            flush_timeout: Duration::from_secs(5),
        }
    }
}
