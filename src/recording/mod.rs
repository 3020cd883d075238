//! Recording session management
//!
//! This module provides the `RecordingSession` state machine that manages:
//! - Ownership of the combined capture stream and its release on every exit path
//! - Encoder control (pause / resume / flush) through an event channel
//! - Active-time accounting across pause / resume
//! - Segment collection and artifact assembly
//! - Microphone mute / unmute without changing stream membership

mod config;
mod encoder;
mod segments;
mod session;
mod state;
mod stats;
mod timer;

pub use config::SessionConfig;
pub use encoder::{Encoder, EncoderConfig, EncoderEvent};
pub use segments::{Artifact, SegmentAccumulator};
pub use session::{RecordingSession, SessionEvent, StartOutcome};
pub use state::{SessionPhase, SessionState};
pub use stats::SessionStatus;
pub use timer::ElapsedTimer;
