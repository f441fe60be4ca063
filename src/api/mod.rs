pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AddressingMode;
use crate::resolver::Orchestrator;

pub use error::{ApiError, ApiResult};

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub addressing: AddressingMode,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, addressing: AddressingMode) -> Self {
        Self {
            orchestrator,
            addressing,
        }
    }
}

/// Only the routes of the configured addressing mode are mounted; the other
/// shape answers 404.
pub fn router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health));

    let routes = match state.addressing {
        AddressingMode::Path => routes
            .route("/api/videos", get(handlers::missing_video_id))
            .route("/api/videos/", get(handlers::missing_video_id))
            .route("/api/videos/{video_id}", get(handlers::get_video)),
        AddressingMode::Body => routes.route("/api/stream_url", post(handlers::post_stream_url)),
    };

    routes.layer(TraceLayer::new_for_http()).with_state(state)
}
