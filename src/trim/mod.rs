//! Trim orchestration
//!
//! Validates a requested time range, then delegates extraction to an external
//! media engine (stream copy first, re-encode fallback) with guaranteed cleanup.

mod engine;
mod ffmpeg;
mod orchestrator;
mod request;

pub use engine::MediaEngine;
pub use ffmpeg::{FfmpegEngine, FfmpegWorkspace};
pub use orchestrator::{ReencodeSettings, TrimStrategy, TrimmedClip, Trimmer};
pub use request::{TrimRange, TrimRequest, MIN_TRIM_SECONDS};
