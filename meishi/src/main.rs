mod api;
mod config;
mod error;
mod extraction;
mod imaging;
mod llm;
mod models;
mod ocr;
mod textfix;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::llm::LlmProvider;
use crate::ocr::OcrEngine;

#[derive(Parser)]
#[command(name = "meishi")]
#[command(about = "Business-card OCR service with phone/URL rectification")]
struct Args {
    /// Override the listen port from MEISHI_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meishi=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "MEISHI_API_KEYS is not set — scan endpoints are locked. Set MEISHI_API_KEYS to enable /api/v1/scans."
        );
    }

    tracing::info!("Initializing recognition engine: {}...", config.ocr.model);
    let ocr = OcrEngine::new(&config.ocr)?;
    if !ocr.is_available() {
        tracing::warn!("Recognition unavailable - scans will fail until a backend is configured");
    }

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - contact field extraction will return empty records");
    }

    let state = AppState::new(config.clone(), ocr, llm);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Meishi starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping...");
}
