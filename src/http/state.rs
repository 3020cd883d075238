use crate::storage::{AnalyticsStore, VideoStore};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Uploaded video files
    pub videos: Arc<VideoStore>,

    /// View / watch analytics
    pub analytics: Arc<AnalyticsStore>,

    /// Base URL used to build share links (no trailing slash)
    pub public_url: String,

    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        videos: VideoStore,
        analytics: AnalyticsStore,
        public_url: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            videos: Arc::new(videos),
            analytics: Arc::new(analytics),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_upload_bytes,
        }
    }

    pub fn share_url(&self, video_id: &str) -> String {
        format!("{}/video/{}", self.public_url, video_id)
    }
}
