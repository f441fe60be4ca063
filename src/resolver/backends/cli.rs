// CLI resolver - asks the native `yt-dlp` binary for the best combined URL
//
// `-f best` selects the best single file that already contains both audio
// and video, so no format selection happens on our side.

use async_trait::async_trait;
use std::path::Path;
use std::process::Command as StdCommand;

use crate::resolver::cookies::{CookieJar, SessionCredential};
use crate::resolver::diagnostics::{diagnose_error, error_line};
use crate::resolver::errors::ResolveError;
use crate::resolver::models::{ResolvedStream, VideoReference};
use crate::resolver::traits::StreamResolver;
use crate::resolver::utils::{run_output_with_timeout, CommandError};

/// Process-based resolver using the yt-dlp binary
pub struct CliResolver {
    ytdlp_path: String,
    /// Staged into a fresh temp file for every run
    cookie_jar: Option<CookieJar>,
    timeout_secs: u64,
}

impl CliResolver {
    pub fn new(ytdlp_path: Option<String>, cookie_jar: Option<CookieJar>, timeout_secs: u64) -> Self {
        Self {
            ytdlp_path: ytdlp_path.unwrap_or_else(Self::find_ytdlp),
            cookie_jar,
            timeout_secs,
        }
    }

    /// Find yt-dlp binary
    pub fn find_ytdlp() -> String {
        let common_paths = [
            "/usr/local/bin/yt-dlp",
            "/usr/bin/yt-dlp",
            "/opt/homebrew/bin/yt-dlp",
        ];

        for path in common_paths {
            if std::path::Path::new(path).exists() {
                return path.to_string();
            }
        }

        if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
            if output.status.success() {
                if let Ok(path) = String::from_utf8(output.stdout) {
                    let trimmed = path.trim();
                    if !trimmed.is_empty() {
                        return trimmed.to_string();
                    }
                }
            }
        }

        "yt-dlp".to_string()
    }

    pub fn ytdlp_path(&self) -> &str {
        &self.ytdlp_path
    }

    /// Build command arguments
    fn build_args(&self, reference: &VideoReference, cookies_file: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "best".to_string(),
            "--get-url".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.timeout_secs.to_string(),
        ];

        if let Some(path) = cookies_file {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().into_owned());
        }

        args.push(reference.watch_url());
        args
    }

    /// First http(s) line of stdout
    fn parse_stdout(stdout: &[u8]) -> Option<String> {
        String::from_utf8_lossy(stdout)
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("http://") || l.starts_with("https://"))
            .map(|l| l.to_string())
    }

    /// Map a failed run onto the error taxonomy
    fn classify_failure(&self, stderr: &str) -> ResolveError {
        let reason = diagnose_error(stderr);
        let line = error_line(stderr).unwrap_or("yt-dlp exited with an error");

        match reason {
            Some(r) if r.is_not_found() => ResolveError::not_found(line),
            Some(r) => {
                if r.cookies_might_help() && self.cookie_jar.is_none() {
                    tracing::info!(
                        "[CliResolver] {} - a cookie jar (SESSION_MODE) might help",
                        r.description()
                    );
                }
                ResolveError::upstream(
                    format!("{}: {}", r.description(), line),
                    Some(stderr.to_string()),
                )
            }
            None => ResolveError::upstream(line, None),
        }
    }
}

#[async_trait]
impl StreamResolver for CliResolver {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn resolve_stream(
        &self,
        reference: &VideoReference,
        _credential: Option<&SessionCredential>,
    ) -> Result<ResolvedStream, ResolveError> {
        let staged = match &self.cookie_jar {
            Some(jar) => Some(jar.stage().map_err(|e| {
                ResolveError::upstream(format!("Failed to stage cookie jar: {}", e), None)
            })?),
            None => None,
        };
        let args = self.build_args(reference, staged.as_ref().map(|f| f.path()));
        tracing::debug!(
            "[CliResolver] Running: {} {}",
            self.ytdlp_path,
            args.join(" ")
        );

        // `staged` lives until the child is gone
        let output = match run_output_with_timeout(&self.ytdlp_path, args, self.timeout_secs).await {
            Ok(out) => out,
            Err(e @ CommandError::TimedOut(_)) => {
                tracing::warn!("[CliResolver] {} for {}", e, reference);
                return Err(ResolveError::upstream(
                    format!("yt-dlp did not finish: {}", e),
                    None,
                ));
            }
            Err(e) => {
                tracing::error!("[CliResolver] {}", e);
                return Err(ResolveError::upstream(e.to_string(), None));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!("[CliResolver] yt-dlp failed for {}: {}", reference, stderr.trim());
            return Err(self.classify_failure(&stderr));
        }

        let url = Self::parse_stdout(&output.stdout).ok_or_else(|| {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            ResolveError::upstream("yt-dlp returned no streaming URL", Some(stderr))
        })?;

        Ok(ResolvedStream {
            video_id: reference.id().to_string(),
            url,
            quality: None,
        })
    }
}
