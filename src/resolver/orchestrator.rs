// Orchestrator - session gate in front of the single configured backend

use std::io::ErrorKind;
use std::path::PathBuf;

use super::backends::{CliResolver, MetadataResolver, WatchPageSource};
use super::cookies::{load_jar, CookieJar, SessionCredential};
use super::errors::ResolveError;
use super::models::{ResolvedStream, VideoReference};
use super::traits::{ResolverConfig, ResolverMode, StreamResolver};

/// Whether requests must carry the cookie jar credential
#[derive(Debug, Clone)]
pub enum SessionMode {
    Disabled,
    Enabled {
        jar_path: PathBuf,
        /// The jar as read at startup, or why it could not be used
        jar: Result<CookieJar, String>,
    },
}

impl SessionMode {
    /// Read the jar once. A missing jar is not fatal here; every request
    /// fails with a configuration error instead.
    pub fn load(jar_path: impl Into<PathBuf>) -> Self {
        let jar_path = jar_path.into();
        let name = jar_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| jar_path.display().to_string());

        let jar = match load_jar(&jar_path) {
            Ok(Some(jar)) => Ok(jar),
            Ok(None) => Err(format!(
                "Configuration Error: {} contains no usable cookies.",
                name
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(format!("Configuration Error: {} file not found.", name))
            }
            Err(e) => Err(format!("Configuration Error: cannot read {}: {}", name, e)),
        };
        if let Err(reason) = &jar {
            tracing::warn!("[Session] {} ({})", reason, jar_path.display());
        }

        Self::Enabled { jar_path, jar }
    }

    pub fn jar(&self) -> Option<&CookieJar> {
        match self {
            Self::Enabled { jar: Ok(jar), .. } => Some(jar),
            _ => None,
        }
    }

    pub fn credential(&self) -> Option<&SessionCredential> {
        self.jar().map(CookieJar::credential)
    }

    /// Short state name for health output
    pub fn status(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabled { jar: Ok(_), .. } => "active",
            Self::Enabled { jar: Err(_), .. } => "missing",
        }
    }
}

pub struct Orchestrator {
    backend: Box<dyn StreamResolver>,
    session: SessionMode,
}

impl Orchestrator {
    pub fn new(backend: Box<dyn StreamResolver>, session: SessionMode) -> Self {
        Self { backend, session }
    }

    /// Build the backend named by `config.mode`
    pub fn from_config(config: &ResolverConfig, session: SessionMode) -> Result<Self, reqwest::Error> {
        let backend: Box<dyn StreamResolver> = match config.mode {
            ResolverMode::Metadata => {
                let source = WatchPageSource::new(config.http_timeout_secs)?;
                Box::new(MetadataResolver::new(Box::new(source)))
            }
            ResolverMode::Process => {
                let cli = CliResolver::new(
                    config.ytdlp_path.clone(),
                    session.jar().cloned(),
                    config.process_timeout_secs,
                );
                tracing::info!("[Orchestrator] Using yt-dlp at {}", cli.ytdlp_path());
                Box::new(cli)
            }
        };

        tracing::info!(
            "[Orchestrator] Backend: {} (session {})",
            backend.name(),
            session.status()
        );
        Ok(Self::new(backend, session))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn session(&self) -> &SessionMode {
        &self.session
    }

    pub async fn resolve(&self, reference: &VideoReference) -> Result<ResolvedStream, ResolveError> {
        let credential = match &self.session {
            SessionMode::Disabled => None,
            SessionMode::Enabled { jar: Ok(jar), .. } => Some(jar.credential()),
            SessionMode::Enabled {
                jar_path,
                jar: Err(reason),
            } => {
                tracing::error!("[Orchestrator] {} ({})", reason, jar_path.display());
                return Err(ResolveError::configuration(reason.clone()));
            }
        };

        tracing::info!(
            "[Orchestrator] Resolving {} with {}",
            reference,
            self.backend.name()
        );

        match self.backend.resolve_stream(reference, credential).await {
            Ok(stream) => {
                tracing::info!("[Orchestrator] ✓ {} resolved", reference);
                Ok(stream)
            }
            Err(e) => {
                tracing::warn!("[Orchestrator] ✗ {} failed: {}", reference, e);
                Err(e)
            }
        }
    }
}
