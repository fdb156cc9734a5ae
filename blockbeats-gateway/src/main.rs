//! blockbeats-gateway - pinning upload proxy service
//!
//! Sits between the marketplace front-end and the pinning API: validates
//! multipart uploads and forwards them with the service credentials, so the
//! pinning token never reaches the browser.

use anyhow::{Context, Result};
use blockbeats_common::config::Settings;
use blockbeats_gateway::{build_router, AppState};
use blockbeats_licensing::PinningClient;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "blockbeats-gateway", version, about = "BlockBeats pinning upload gateway")]
struct Cli {
    /// Settings file to load instead of the platform config
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting BlockBeats Upload Gateway (blockbeats-gateway) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(path.as_path())),
        None => Settings::load(),
    }
    .context("Failed to load settings")?;

    // The gateway exists to hold the pinning credentials; refuse to start
    // without them rather than 500 on the first upload
    let jwt = settings
        .require_pinning_jwt()
        .context("Gateway cannot start without a pinning token")?;
    let publisher = PinningClient::new(settings.pinning_api_url.clone(), jwt);

    let state = AppState::new(Arc::new(publisher));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    info!("blockbeats-gateway listening on http://{}", settings.bind_addr);
    info!("Health check: http://{}/health", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
