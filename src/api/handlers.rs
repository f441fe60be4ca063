use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::models::{HealthResponse, StreamUrlRequest, StreamUrlResponse};
use super::AppState;
use crate::config::AddressingMode;
use crate::resolver::{ResolveError, ResolvedStream, VideoReference};

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> &'static str {
    match state.addressing {
        AddressingMode::Path => {
            "Welcome to the stream URL API server. Use GET /api/videos/<video_id>"
        }
        AddressingMode::Body => {
            "Welcome to the stream URL API server. Use POST /api/stream_url with {\"url\": \"<youtube url>\"}"
        }
    }
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.orchestrator.backend_name(),
        addressing: state.addressing.to_string(),
        session: state.orchestrator.session().status(),
    })
}

/// GET /api/videos/{video_id}
pub async fn get_video(
    Path(video_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StreamUrlResponse>> {
    tracing::debug!("[Api] GET video '{}'", video_id);

    let reference = VideoReference::from_id(&video_id)?;
    let stream = state.orchestrator.resolve(&reference).await?;
    Ok(Json(success(&state, stream)))
}

/// GET /api/videos and /api/videos/
pub async fn missing_video_id() -> ApiError {
    ResolveError::invalid_input("Invalid or missing YouTube Video ID in the URL path.").into()
}

/// POST /api/stream_url
pub async fn post_stream_url(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StreamUrlRequest>, JsonRejection>,
) -> ApiResult<Json<StreamUrlResponse>> {
    let Json(request) = body?;
    let url = request
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ResolveError::invalid_input("Missing 'url' in request body."))?;
    tracing::debug!("[Api] POST stream_url '{}'", url);

    let reference = VideoReference::from_url(&url)?;
    let stream = state.orchestrator.resolve(&reference).await?;
    Ok(Json(success(&state, stream)))
}

fn success(state: &AppState, stream: ResolvedStream) -> StreamUrlResponse {
    let orchestrator = &state.orchestrator;
    let note = if orchestrator.session().credential().is_some() {
        "Extracted with session/preference data from cookies."
    } else {
        "This URL points to the best available single stream (video and audio combined)."
    };

    StreamUrlResponse {
        message: format!(
            "Successfully extracted the best combined streaming URL using {}.",
            orchestrator.backend_name()
        ),
        video_id: stream.video_id,
        url: stream.url,
        quality: stream.quality,
        note: Some(note.to_string()),
    }
}
