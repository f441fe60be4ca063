//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::models::ErrorResponse;
use crate::resolver::{FailureKind, ResolveError, MAX_DETAIL_LEN};
use crate::resolver::utils::truncate_detail;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Request body could not be read as JSON
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Resolve(e) => e.kind(),
            ApiError::MalformedBody(_) => FailureKind::InvalidInput,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind() {
            FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::UpstreamFailure | FailureKind::ConfigurationError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        let kind = self.kind();
        let (error, details, stderr) = match self {
            ApiError::MalformedBody(reason) => (
                "Request body must be JSON like {\"url\": \"https://www.youtube.com/watch?v=...\"}."
                    .to_string(),
                Some(truncate_detail(reason, MAX_DETAIL_LEN)),
                None,
            ),
            ApiError::Resolve(ResolveError::InvalidInput(msg)) => (msg.clone(), None, None),
            ApiError::Resolve(ResolveError::NotFound(msg)) => (
                msg.clone(),
                Some(
                    "Ensure the video is publicly accessible, not geo-blocked, and the ID is correct."
                        .to_string(),
                ),
                None,
            ),
            ApiError::Resolve(ResolveError::Upstream { detail, stderr }) => (
                "Failed to process video information.".to_string(),
                Some(detail.clone()),
                stderr.clone(),
            ),
            ApiError::Resolve(ResolveError::Configuration(msg)) => (
                msg.clone(),
                Some("Place cookies.txt in the working directory or point COOKIES_FILE at it.".to_string()),
                None,
            ),
        };

        ErrorResponse {
            error,
            kind,
            details,
            stderr,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Api] {} ({})", self, status);
        } else {
            tracing::debug!("[Api] {} ({})", self, status);
        }

        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ResolveError::invalid_input("bad"), StatusCode::BAD_REQUEST),
            (ResolveError::not_found("gone"), StatusCode::NOT_FOUND),
            (ResolveError::upstream("boom", None), StatusCode::INTERNAL_SERVER_ERROR),
            (ResolveError::configuration("no jar"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
        assert_eq!(
            ApiError::MalformedBody("eof".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_body_carries_stderr() {
        let err = ApiError::from(ResolveError::upstream(
            "Access denied (HTTP 403): ERROR: HTTP Error 403",
            Some("ERROR: HTTP Error 403: Forbidden".to_string()),
        ));
        let body = err.body();
        assert_eq!(body.kind, FailureKind::UpstreamFailure);
        assert_eq!(body.stderr.as_deref(), Some("ERROR: HTTP Error 403: Forbidden"));
        assert!(body.details.unwrap().starts_with("Access denied"));
    }
}
