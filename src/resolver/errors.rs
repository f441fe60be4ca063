// Error types for stream resolution

use serde::Serialize;
use thiserror::Error;

use super::utils::truncate_detail;

/// Upper bound for any diagnostic text that leaves the resolver
pub const MAX_DETAIL_LEN: usize = 200;

/// Coarse failure category, mapped 1:1 onto HTTP status codes by the API layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    InvalidInput,
    NotFound,
    UpstreamFailure,
    ConfigurationError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Client-supplied id or URL is malformed
    #[error("Invalid video reference: {0}")]
    InvalidInput(String),

    /// Backend answered, but the video does not resolve to a combined stream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend errored, timed out, or produced unusable output
    #[error("Upstream failure: {detail}")]
    Upstream {
        detail: String,
        stderr: Option<String>,
    },

    /// Session mode is enabled but no usable cookie jar is available
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ResolveError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(truncate_detail(&msg.into(), MAX_DETAIL_LEN))
    }

    /// Build an upstream failure; both strings are cut to [`MAX_DETAIL_LEN`]
    pub fn upstream(detail: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Upstream {
            detail: truncate_detail(&detail.into(), MAX_DETAIL_LEN),
            stderr: stderr
                .map(|s| truncate_detail(s.trim(), MAX_DETAIL_LEN))
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Upstream { .. } => FailureKind::UpstreamFailure,
            Self::Configuration(_) => FailureKind::ConfigurationError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_detail_is_bounded() {
        let err = ResolveError::upstream("x".repeat(1000), Some("e".repeat(1000)));
        match err {
            ResolveError::Upstream { detail, stderr } => {
                assert!(detail.chars().count() <= MAX_DETAIL_LEN);
                assert!(stderr.unwrap().chars().count() <= MAX_DETAIL_LEN);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_blank_stderr_is_dropped() {
        let err = ResolveError::upstream("boom", Some("  \n".to_string()));
        assert_eq!(
            err,
            ResolveError::Upstream {
                detail: "boom".to_string(),
                stderr: None
            }
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ResolveError::invalid_input("x").kind(), FailureKind::InvalidInput);
        assert_eq!(ResolveError::not_found("x").kind(), FailureKind::NotFound);
        assert_eq!(ResolveError::upstream("x", None).kind(), FailureKind::UpstreamFailure);
        assert_eq!(
            ResolveError::configuration("x").kind(),
            FailureKind::ConfigurationError
        );
    }
}
