use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // Recordings are uploaded straight from the browser
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Videos
        .route(
            "/upload",
            post(handlers::upload_video).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/video/:video_id", get(handlers::get_video))
        // Analytics
        .route("/analytics/view", post(handlers::record_view))
        .route(
            "/analytics",
            post(handlers::record_progress).get(handlers::get_analytics),
        )
        .layer(cors)
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
