// Common data models for stream resolution

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::errors::ResolveError;

lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref YOUTUBE_URL_RE: Regex = Regex::new(
        r"^(?i:https?://)?(?P<host>(?i:(?:www\.|m\.|music\.)?youtube\.com|youtu\.be|(?:www\.)?youtube-nocookie\.com))(?::\d+)?(?P<rest>[/?#].*)?$"
    )
    .unwrap();
    // youtu.be/ID
    static ref SHORT_LINK_ID_RE: Regex =
        Regex::new(r"^/(?P<id>[A-Za-z0-9_-]{11})(?:[/?#&].*)?$").unwrap();
    static ref PATH_ID_RE: Regex =
        Regex::new(r"^/(?:embed|v|shorts|live)/(?P<id>[A-Za-z0-9_-]{11})(?:[/?#&].*)?$").unwrap();
    static ref QUERY_ID_RE: Regex = Regex::new(r"[?&]v=(?P<id>[A-Za-z0-9_-]{11})(?:[&#].*)?$").unwrap();
}

/// A syntactically valid YouTube video reference.
///
/// Construction is the only validation point: once a `VideoReference`
/// exists, its id is 11 characters from `[A-Za-z0-9_-]`. Nothing is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    id: String,
}

impl VideoReference {
    /// Accept a bare 11-character id
    pub fn from_id(id: &str) -> Result<Self, ResolveError> {
        if !is_valid_video_id(id) {
            return Err(ResolveError::invalid_input(
                "Invalid or missing YouTube Video ID in the URL path.",
            ));
        }
        Ok(Self { id: id.to_string() })
    }

    /// Accept a URL on a YouTube host and extract its video id
    pub fn from_url(url: &str) -> Result<Self, ResolveError> {
        let caps = YOUTUBE_URL_RE
            .captures(url.trim())
            .ok_or_else(|| ResolveError::invalid_input("URL is not a valid YouTube URL"))?;
        let short_link = caps
            .name("host")
            .map_or(false, |h| h.as_str().eq_ignore_ascii_case("youtu.be"));
        let rest = caps.name("rest").map_or("", |m| m.as_str());

        let id_caps = if short_link {
            SHORT_LINK_ID_RE.captures(rest)
        } else {
            QUERY_ID_RE.captures(rest).or_else(|| PATH_ID_RE.captures(rest))
        };
        let id = id_caps
            .and_then(|caps| caps.name("id"))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ResolveError::invalid_input("Video ID not found in URL"))?;

        Ok(Self { id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical watch URL handed to the backends
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

pub fn is_valid_video_id(id: &str) -> bool {
    VIDEO_ID_RE.is_match(id)
}

/// One candidate rendition of a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// YouTube format tag (e.g. 18, 22, 137, 140)
    pub itag: u32,
    pub mime_type: String,
    pub has_audio: bool,
    pub has_video: bool,
    /// Human readable quality (e.g. "720p"); absent for audio-only streams
    pub quality_label: Option<String>,
    /// Ordinal used to compare renditions; higher is better
    pub quality_rank: u32,
    pub url: String,
}

impl Format {
    /// Progressive stream with audio and video multiplexed together
    pub fn is_combined(&self) -> bool {
        self.has_audio && self.has_video
    }
}

/// Successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub video_id: String,
    pub url: String,
    pub quality: Option<String>,
}
