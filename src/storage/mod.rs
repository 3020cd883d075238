//! Server-side persistence
//!
//! - `VideoStore`: uploaded recordings, one file per video id
//! - `AnalyticsStore`: view / watch analytics, one JSON aggregate keyed by id

mod analytics;
mod videos;

pub use analytics::{
    AnalyticsStore, AnalyticsSummary, ProgressUpdate, VideoRecord, COMPLETION_THRESHOLD,
};
pub use videos::VideoStore;
