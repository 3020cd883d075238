use super::state::AppState;
use crate::error::StorageError;
use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub video_id: String,
    pub share_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub video_id: String,
    pub view_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub video_id: Option<String>,
    pub session_id: Option<String>,
    pub progress: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub video_id: String,
    pub session_id: String,
    pub progress: f64,
    pub watch_completions: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn storage_error_response(err: StorageError) -> Response {
    match err {
        StorageError::NotFound(_) | StorageError::InvalidId(_) => {
            error_response(StatusCode::NOT_FOUND, "Video not found")
        }
        other => {
            error!("Storage failure: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
        }
    }
}

/// Treat missing and blank fields alike
fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /upload
/// Store an uploaded recording (multipart field `video`)
pub async fn upload_video(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut video = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload: {}", e);
                return error_response(e.status(), format!("Invalid upload: {}", e.body_text()));
            }
        };

        if field.name() != Some("video") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("video/") {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Uploaded file must be a video, got '{}'", content_type),
            );
        }

        match field.bytes().await {
            Ok(bytes) => video = Some(bytes),
            Err(e) => {
                warn!("Failed to read upload body: {}", e);
                return error_response(e.status(), format!("Invalid upload: {}", e.body_text()));
            }
        }
        break;
    }

    let Some(bytes) = video.filter(|b| !b.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "No video file provided");
    };

    let video_id = match state.videos.save(&bytes).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to store upload: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store video");
        }
    };

    if let Err(e) = state.analytics.register(&video_id).await {
        error!("Failed to create analytics record for {}: {}", video_id, e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store video");
    }

    info!("Uploaded video {} ({} bytes)", video_id, bytes.len());

    (
        StatusCode::CREATED,
        Json(UploadResponse {
            share_url: state.share_url(&video_id),
            video_id,
        }),
    )
        .into_response()
}

/// GET /video/:video_id
/// Serve a stored recording
pub async fn get_video(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    match state.videos.load(&video_id).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "video/webm"),
                (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// POST /analytics/view
/// Count a view
pub async fn record_view(
    State(state): State<AppState>,
    payload: Result<Json<ViewRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };
    let Some(video_id) = required(req.video_id) else {
        return error_response(StatusCode::BAD_REQUEST, "videoId is required");
    };

    match state.analytics.record_view(&video_id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ViewResponse {
                video_id,
                view_count: record.view_count,
            }),
        )
            .into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// POST /analytics
/// Upsert a watch session's progress
pub async fn record_progress(
    State(state): State<AppState>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };

    let (Some(video_id), Some(session_id), Some(progress)) =
        (required(req.video_id), required(req.session_id), req.progress)
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "videoId, sessionId and progress are required",
        );
    };

    if !(0.0..=1.0).contains(&progress) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "progress must be between 0 and 1",
        );
    }

    match state
        .analytics
        .record_progress(&video_id, &session_id, progress)
        .await
    {
        Ok(update) => (
            StatusCode::OK,
            Json(ProgressResponse {
                video_id,
                session_id,
                progress,
                watch_completions: update.record.watch_completions,
            }),
        )
            .into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// GET /analytics?videoId=
/// Analytics summary for a video
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Response {
    let Some(video_id) = required(query.video_id) else {
        return error_response(StatusCode::BAD_REQUEST, "videoId is required");
    };

    match state.analytics.summary(&video_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
