// Resolver capability traits and their configuration

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::cookies::SessionCredential;
use super::errors::ResolveError;
use super::models::{Format, ResolvedStream, VideoReference};

/// Which backend serves every request of this deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverMode {
    /// In-process watch-page parsing, then format selection
    #[default]
    Metadata,
    /// `yt-dlp -f best --get-url`
    Process,
}

impl fmt::Display for ResolverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => write!(f, "metadata"),
            Self::Process => write!(f, "process"),
        }
    }
}

impl FromStr for ResolverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metadata" => Ok(Self::Metadata),
            "process" | "cli" | "yt-dlp" => Ok(Self::Process),
            other => Err(format!("unknown resolver backend '{}'", other)),
        }
    }
}

/// Configuration for the resolver backends
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub mode: ResolverMode,
    /// Path to cookies.txt, only set when session mode is enabled
    pub cookies_path: Option<PathBuf>,
    /// yt-dlp binary; auto-detected when `None`
    pub ytdlp_path: Option<String>,
    /// Upper bound for one yt-dlp invocation
    pub process_timeout_secs: u64,
    /// Upper bound for one watch-page fetch
    pub http_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mode: ResolverMode::Metadata,
            cookies_path: None,
            ytdlp_path: None,
            process_timeout_secs: 15,
            http_timeout_secs: 15,
        }
    }
}

impl ResolverConfig {
    pub fn with_mode(mut self, mode: ResolverMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_ytdlp_path(mut self, path: Option<String>) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_process_timeout(mut self, seconds: u64) -> Self {
        self.process_timeout_secs = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_secs = seconds;
        self
    }
}

/// Resolves a reference to one playable URL
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Name of the resolver (for logging)
    fn name(&self) -> &'static str;

    async fn resolve_stream(
        &self,
        reference: &VideoReference,
        credential: Option<&SessionCredential>,
    ) -> Result<ResolvedStream, ResolveError>;
}

/// Lists the renditions available for a video
#[async_trait]
pub trait FormatSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// All formats with a usable URL; `credential` goes out as the Cookie header
    async fn resolve_formats(
        &self,
        reference: &VideoReference,
        credential: Option<&SessionCredential>,
    ) -> Result<Vec<Format>, ResolveError>;
}
