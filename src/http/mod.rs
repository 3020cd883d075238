//! HTTP API server for sharing recordings
//!
//! This module provides a REST API used by the recorder and the share page:
//! - POST /upload - Store a recording, returns its id and share URL
//! - GET /video/:id - Serve a stored recording
//! - POST /analytics/view - Count a view
//! - POST /analytics - Record a watch session's progress
//! - GET /analytics?videoId= - Analytics summary
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ProgressRequest, UploadResponse, ViewRequest};
pub use routes::create_router;
pub use state::AppState;
