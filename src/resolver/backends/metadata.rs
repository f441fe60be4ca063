// Metadata resolver - in-process format listing + FormatSelector
//
// WatchPageSource fetches the watch page over HTTP and reads the embedded
// `ytInitialPlayerResponse` JSON. Formats guarded by `signatureCipher`
// carry no direct URL and are skipped.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use serde_json::Value;
use std::time::Duration;

use crate::resolver::cookies::SessionCredential;
use crate::resolver::errors::ResolveError;
use crate::resolver::format_selector::FormatSelector;
use crate::resolver::models::{Format, ResolvedStream, VideoReference};
use crate::resolver::traits::{FormatSource, StreamResolver};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

lazy_static! {
    static ref PLAYER_RESPONSE_RE: Regex =
        Regex::new(r"ytInitialPlayerResponse\s*=\s*\{").unwrap();
}

/// Resolver that lists formats and keeps the best combined one
pub struct MetadataResolver {
    source: Box<dyn FormatSource>,
}

impl MetadataResolver {
    pub fn new(source: Box<dyn FormatSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl StreamResolver for MetadataResolver {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn resolve_stream(
        &self,
        reference: &VideoReference,
        credential: Option<&SessionCredential>,
    ) -> Result<ResolvedStream, ResolveError> {
        let formats = self.source.resolve_formats(reference, credential).await?;
        tracing::debug!(
            "[MetadataResolver] {} formats from {} for {}",
            formats.len(),
            self.source.name(),
            reference
        );

        let best = FormatSelector::select_best(&formats).ok_or_else(|| {
            ResolveError::not_found("No combined high-quality streaming format found for this video.")
        })?;

        Ok(ResolvedStream {
            video_id: reference.id().to_string(),
            url: best.url.clone(),
            quality: best.quality_label.clone(),
        })
    }
}

/// Reads formats straight from the YouTube watch page
pub struct WatchPageSource {
    client: reqwest::Client,
    base_url: String,
}

impl WatchPageSource {
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Serve watch pages from another origin (mirrors, local fixtures)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn page_url(&self, reference: &VideoReference) -> String {
        // bpctr/has_verified skip the content warning interstitial
        format!(
            "{}/watch?v={}&bpctr=9999999999&has_verified=1",
            self.base_url,
            reference.id()
        )
    }

    async fn fetch_page(
        &self,
        url: &str,
        credential: Option<&SessionCredential>,
    ) -> Result<String, ResolveError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        if let Some(cred) = credential {
            request = request.header(COOKIE, cred.header_value());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResolveError::upstream(format!("Watch page request failed: {}", e), None))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::upstream(
                format!("YouTube returned HTTP {}", status),
                None,
            ));
        }

        response
            .text()
            .await
            .map_err(|e| ResolveError::upstream(format!("Failed to read watch page: {}", e), None))
    }

    /// Locate and decode the `ytInitialPlayerResponse` object
    fn extract_player_response(page: &str) -> Result<Value, ResolveError> {
        let m = PLAYER_RESPONSE_RE.find(page).ok_or_else(|| {
            ResolveError::upstream("No ytInitialPlayerResponse found in watch page", None)
        })?;
        // The regex ends on the opening brace; the stream deserializer stops
        // after the first complete value, ignoring the trailing script.
        let json_start = m.end() - 1;
        serde_json::Deserializer::from_str(&page[json_start..])
            .into_iter::<Value>()
            .next()
            .ok_or_else(|| ResolveError::upstream("Empty ytInitialPlayerResponse", None))?
            .map_err(|e| {
                ResolveError::upstream(format!("Error parsing ytInitialPlayerResponse: {}", e), None)
            })
    }

    /// Map `playabilityStatus` onto the error taxonomy
    fn check_playability(player: &Value) -> Result<(), ResolveError> {
        let status = &player["playabilityStatus"];
        let code = status["status"].as_str().unwrap_or("OK");
        let reason = status["reason"].as_str().unwrap_or("");

        match code {
            "OK" => Ok(()),
            "ERROR" => Err(ResolveError::not_found(if reason.is_empty() {
                "Video unavailable"
            } else {
                reason
            })),
            other => Err(ResolveError::upstream(
                format!("YouTube reported {}: {}", other, reason),
                None,
            )),
        }
    }

    fn parse_formats(player: &Value) -> Vec<Format> {
        let streaming = &player["streamingData"];
        let mut formats = Vec::new();
        let mut ciphered = 0usize;

        for key in ["formats", "adaptiveFormats"] {
            let Some(array) = streaming[key].as_array() else {
                tracing::debug!("[WatchPageSource] No {} in streamingData", key);
                continue;
            };
            for f in array {
                match Self::parse_format(f) {
                    Some(format) => formats.push(format),
                    None => ciphered += 1,
                }
            }
        }

        if ciphered > 0 {
            tracing::debug!(
                "[WatchPageSource] Skipped {} formats without a direct url",
                ciphered
            );
        }
        formats
    }

    fn parse_format(f: &Value) -> Option<Format> {
        let url = f["url"].as_str()?.to_string();
        let mime_type = f["mimeType"].as_str().unwrap_or("").to_string();
        let has_video = mime_type.starts_with("video/");
        // Progressive formats carry audio fields; adaptive video-only ones don't.
        let has_audio = mime_type.starts_with("audio/")
            || f.get("audioQuality").is_some()
            || f.get("audioSampleRate").is_some();
        let quality_label = f["qualityLabel"].as_str().map(|s| s.to_string());

        let quality_rank = if has_video {
            f["height"]
                .as_u64()
                .map(|h| h as u32)
                .or_else(|| quality_label.as_deref().and_then(FormatSelector::rank_from_label))
                .unwrap_or(0)
        } else {
            // Audio-only: kbps, only compared against other audio streams
            f["averageBitrate"]
                .as_u64()
                .or_else(|| f["bitrate"].as_u64())
                .map(|b| (b / 1000) as u32)
                .unwrap_or(0)
        };

        Some(Format {
            itag: f["itag"].as_u64().unwrap_or(0) as u32,
            mime_type,
            has_audio,
            has_video,
            quality_label,
            quality_rank,
            url,
        })
    }
}

#[async_trait]
impl FormatSource for WatchPageSource {
    fn name(&self) -> &'static str {
        "watch-page"
    }

    async fn resolve_formats(
        &self,
        reference: &VideoReference,
        credential: Option<&SessionCredential>,
    ) -> Result<Vec<Format>, ResolveError> {
        let url = self.page_url(reference);
        tracing::debug!(
            "[WatchPageSource] Fetching {} (cookies: {})",
            url,
            credential.is_some()
        );

        let page = self.fetch_page(&url, credential).await?;
        let player = Self::extract_player_response(&page)?;
        Self::check_playability(&player)?;
        Ok(Self::parse_formats(&player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn player_response() -> Value {
        json!({
            "playabilityStatus": { "status": "OK" },
            "streamingData": {
                "formats": [
                    {
                        "itag": 18,
                        "url": "https://rr1.googlevideo.com/videoplayback?itag=18",
                        "mimeType": "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"",
                        "width": 640, "height": 360,
                        "qualityLabel": "360p",
                        "audioQuality": "AUDIO_QUALITY_LOW",
                        "audioSampleRate": "44100"
                    },
                    {
                        "itag": 22,
                        "signatureCipher": "s=abc&sp=sig&url=https%3A%2F%2Frr1.googlevideo.com",
                        "mimeType": "video/mp4; codecs=\"avc1.64001F, mp4a.40.2\"",
                        "height": 720,
                        "qualityLabel": "720p",
                        "audioQuality": "AUDIO_QUALITY_MEDIUM"
                    }
                ],
                "adaptiveFormats": [
                    {
                        "itag": 137,
                        "url": "https://rr1.googlevideo.com/videoplayback?itag=137",
                        "mimeType": "video/mp4; codecs=\"avc1.640028\"",
                        "height": 1080,
                        "qualityLabel": "1080p"
                    },
                    {
                        "itag": 140,
                        "url": "https://rr1.googlevideo.com/videoplayback?itag=140",
                        "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"",
                        "bitrate": 130000,
                        "averageBitrate": 129000,
                        "audioQuality": "AUDIO_QUALITY_MEDIUM"
                    }
                ]
            }
        })
    }

    fn watch_page(player: &Value) -> String {
        format!(
            "<html><script>var ytInitialPlayerResponse = {};var meta = {{\"x\":1}};</script></html>",
            player
        )
    }

    #[test]
    fn test_extract_player_response() {
        let page = watch_page(&player_response());
        let player = WatchPageSource::extract_player_response(&page).unwrap();
        assert_eq!(player["playabilityStatus"]["status"], "OK");
    }

    #[test]
    fn test_missing_player_response() {
        let err = WatchPageSource::extract_player_response("<html></html>").unwrap_err();
        assert_eq!(err.kind(), crate::resolver::errors::FailureKind::UpstreamFailure);
    }

    #[test]
    fn test_parse_formats_flags() {
        let formats = WatchPageSource::parse_formats(&player_response());
        // itag 22 is ciphered and skipped
        let itags: Vec<u32> = formats.iter().map(|f| f.itag).collect();
        assert_eq!(itags, vec![18, 137, 140]);

        let progressive = &formats[0];
        assert!(progressive.has_audio && progressive.has_video);
        assert_eq!(progressive.quality_rank, 360);

        let video_only = &formats[1];
        assert!(video_only.has_video && !video_only.has_audio);
        assert_eq!(video_only.quality_rank, 1080);

        let audio_only = &formats[2];
        assert!(audio_only.has_audio && !audio_only.has_video);
        assert_eq!(audio_only.quality_rank, 129);
    }

    #[test]
    fn test_playability_error_is_not_found() {
        let player = json!({
            "playabilityStatus": { "status": "ERROR", "reason": "Video unavailable" }
        });
        let err = WatchPageSource::check_playability(&player).unwrap_err();
        assert_eq!(err, ResolveError::NotFound("Video unavailable".to_string()));
    }

    #[test]
    fn test_playability_login_required_is_upstream() {
        let player = json!({
            "playabilityStatus": {
                "status": "LOGIN_REQUIRED",
                "reason": "Sign in to confirm you're not a bot"
            }
        });
        let err = WatchPageSource::check_playability(&player).unwrap_err();
        assert_eq!(err.kind(), crate::resolver::errors::FailureKind::UpstreamFailure);
    }

    struct StaticSource {
        formats: Vec<Format>,
        seen_cookie: Arc<std::sync::Mutex<Option<String>>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FormatSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn resolve_formats(
            &self,
            _reference: &VideoReference,
            credential: Option<&SessionCredential>,
        ) -> Result<Vec<Format>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_cookie.lock().unwrap() = credential.map(|c| c.header_value().to_string());
            Ok(self.formats.clone())
        }
    }

    #[tokio::test]
    async fn test_metadata_resolver_picks_best_combined() {
        let formats = WatchPageSource::parse_formats(&player_response());
        let seen = Arc::new(std::sync::Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = MetadataResolver::new(Box::new(StaticSource {
            formats,
            seen_cookie: seen.clone(),
            calls: calls.clone(),
        }));

        let reference = VideoReference::from_id("dQw4w9WgXcQ").unwrap();
        let credential = crate::resolver::cookies::parse_jar(
            ".youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n",
        );
        let stream = resolver
            .resolve_stream(&reference, credential.as_ref())
            .await
            .unwrap();

        assert_eq!(stream.url, "https://rr1.googlevideo.com/videoplayback?itag=18");
        assert_eq!(stream.quality.as_deref(), Some("360p"));
        assert_eq!(seen.lock().unwrap().as_deref(), Some("SID=abc"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_metadata_resolver_no_combined_is_not_found() {
        let formats: Vec<Format> = WatchPageSource::parse_formats(&player_response())
            .into_iter()
            .filter(|f| !f.is_combined())
            .collect();
        let resolver = MetadataResolver::new(Box::new(StaticSource {
            formats,
            seen_cookie: Arc::new(std::sync::Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }));

        let reference = VideoReference::from_id("dQw4w9WgXcQ").unwrap();
        let err = resolver.resolve_stream(&reference, None).await.unwrap_err();
        assert_eq!(err.kind(), crate::resolver::errors::FailureKind::NotFound);
    }

    /// Local watch-page server recording the Cookie header of each request
    async fn serve_watch_page(seen: Arc<std::sync::Mutex<Vec<Option<String>>>>) -> String {
        use axum::http::{header, HeaderMap};
        use axum::{response::Html, routing::get, Router};

        let page = watch_page(&player_response());
        let app = Router::new().route(
            "/watch",
            get(move |headers: HeaderMap| {
                let seen = seen.clone();
                let page = page.clone();
                async move {
                    let cookie = headers
                        .get(header::COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    seen.lock().unwrap().push(cookie);
                    Html(page)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_cookie_header_goes_out_only_with_credential() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let base_url = serve_watch_page(seen.clone()).await;
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let source = WatchPageSource::with_client(client).with_base_url(base_url);

        let reference = VideoReference::from_id("dQw4w9WgXcQ").unwrap();
        let credential = crate::resolver::cookies::parse_jar(
            ".youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n",
        );

        let formats = source
            .resolve_formats(&reference, credential.as_ref())
            .await
            .unwrap();
        assert_eq!(formats.len(), 3);
        source.resolve_formats(&reference, None).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[Some("SID=abc".to_string()), None]);
    }

    #[test]
    fn test_page_url_uses_base() {
        let source = WatchPageSource::with_client(reqwest::Client::new());
        let reference = VideoReference::from_id("dQw4w9WgXcQ").unwrap();
        assert_eq!(
            source.page_url(&reference),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&bpctr=9999999999&has_verified=1"
        );
        let local = WatchPageSource::with_client(reqwest::Client::new())
            .with_base_url("http://127.0.0.1:8080/");
        assert!(local.page_url(&reference).starts_with("http://127.0.0.1:8080/watch?v="));
    }
}
