//! Service configuration.

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::resolver::{ResolverConfig, ResolverMode};

/// How clients address a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressingMode {
    /// `GET /api/videos/{video_id}`
    #[default]
    Path,
    /// `POST /api/stream_url` with `{"url": "..."}`
    Body,
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Body => write!(f, "body"),
        }
    }
}

impl FromStr for AddressingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "path" | "get" => Ok(Self::Path),
            "body" | "post" => Ok(Self::Body),
            other => Err(format!("unknown addressing mode '{}'", other)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    pub addressing: AddressingMode,
    /// Require the cookie jar on every request
    pub session_mode: bool,
    pub cookies_file: PathBuf,
    pub log_format: LogFormat,
    pub resolver: ResolverConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            addressing: AddressingMode::Path,
            session_mode: false,
            cookies_file: PathBuf::from("cookies.txt"),
            log_format: LogFormat::Pretty,
            resolver: ResolverConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("API_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("API_PORT must be a port number, got '{}'", raw))?,
            None => defaults.port,
        };

        let addressing = match var("ADDRESSING_MODE") {
            Some(raw) => raw.parse().map_err(|e| anyhow!("ADDRESSING_MODE: {}", e))?,
            None => defaults.addressing,
        };

        let mode: ResolverMode = match var("RESOLVER_BACKEND") {
            Some(raw) => raw.parse().map_err(|e| anyhow!("RESOLVER_BACKEND: {}", e))?,
            None => ResolverMode::default(),
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e| anyhow!("LOG_FORMAT: {}", e))?,
            None => defaults.log_format,
        };

        let session_mode = match var("SESSION_MODE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                anyhow!("SESSION_MODE must be true or false, got '{}'", raw)
            })?,
            None => defaults.session_mode,
        };

        let cookies_file = var("COOKIES_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.cookies_file);

        let process_timeout = parse_secs(var("PROCESS_TIMEOUT_SECS"), "PROCESS_TIMEOUT_SECS")?;
        let http_timeout = parse_secs(var("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS")?;

        let resolver = ResolverConfig::default()
            .with_mode(mode)
            .with_cookies_path(session_mode.then(|| cookies_file.clone()))
            .with_ytdlp_path(var("YTDLP_PATH"))
            .with_process_timeout(process_timeout.unwrap_or(defaults.resolver.process_timeout_secs))
            .with_http_timeout(http_timeout.unwrap_or(defaults.resolver.http_timeout_secs));

        Ok(Self {
            host: var("API_HOST").unwrap_or(defaults.host),
            port,
            addressing,
            session_mode,
            cookies_file,
            log_format,
            resolver,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_secs(raw: Option<String>, key: &str) -> Result<Option<u64>> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", key, raw))?;
            if secs == 0 {
                return Err(anyhow!("{} must be greater than zero", key));
            }
            Ok(Some(secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.addressing, AddressingMode::Path);
        assert_eq!(config.resolver.mode, ResolverMode::Metadata);
        assert!(!config.session_mode);
        assert!(config.resolver.cookies_path.is_none());
        assert_eq!(config.resolver.process_timeout_secs, 15);
    }

    #[test]
    fn test_process_body_session() {
        let config = config_from(&[
            ("RESOLVER_BACKEND", "process"),
            ("ADDRESSING_MODE", "body"),
            ("SESSION_MODE", "true"),
            ("COOKIES_FILE", "/etc/app/cookies.txt"),
            ("PROCESS_TIMEOUT_SECS", "20"),
            ("API_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.resolver.mode, ResolverMode::Process);
        assert_eq!(config.addressing, AddressingMode::Body);
        assert_eq!(
            config.resolver.cookies_path,
            Some(PathBuf::from("/etc/app/cookies.txt"))
        );
        assert_eq!(config.resolver.process_timeout_secs, 20);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("RESOLVER_BACKEND", "lux")]).is_err());
        assert!(config_from(&[("ADDRESSING_MODE", "query")]).is_err());
        assert!(config_from(&[("SESSION_MODE", "maybe")]).is_err());
        assert!(config_from(&[("API_PORT", "http")]).is_err());
        assert!(config_from(&[("PROCESS_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("API_HOST", " "), ("LOG_FORMAT", "")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
