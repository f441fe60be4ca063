pub mod api;
pub mod config;
pub mod logging;
pub mod resolver;

use anyhow::Context;
use std::sync::Arc;

use api::AppState;
use config::AppConfig;
use resolver::{Orchestrator, SessionMode};

/// Load config, build the configured backend and serve until Ctrl+C
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    logging::init(config.log_format);

    tracing::info!(
        "[Server] Starting stream-url-api {} (backend={}, addressing={}, session_mode={})",
        env!("CARGO_PKG_VERSION"),
        config.resolver.mode,
        config.addressing,
        config.session_mode
    );

    let session = match &config.resolver.cookies_path {
        Some(path) => SessionMode::load(path.clone()),
        None => SessionMode::Disabled,
    };

    let orchestrator = Orchestrator::from_config(&config.resolver, session)
        .context("failed to build HTTP client for the metadata backend")?;
    let state = Arc::new(AppState::new(orchestrator, config.addressing));
    let app = api::router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("[Server] Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("[Server] Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[Server] Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[Server] Received shutdown signal");
}
