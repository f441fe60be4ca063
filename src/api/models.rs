use serde::{Deserialize, Serialize};

use crate::resolver::FailureKind;

/// Body of `POST /api/stream_url`.
#[derive(Debug, Deserialize)]
pub struct StreamUrlRequest {
    /// YouTube URL to resolve. Optional here so a missing field is a 400, not a 422.
    #[serde(default)]
    pub url: Option<String>,
}

/// Successful resolution envelope.
#[derive(Debug, Serialize)]
pub struct StreamUrlResponse {
    pub message: String,
    pub video_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Error envelope shared by every failure status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

/// `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub addressing: String,
    pub session: &'static str,
}
