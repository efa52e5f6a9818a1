mod config;

use clap::Parser as _;
use config::Config;
use tokio::net::TcpListener;
use tracing::{info, warn};
use voxgate::{AppState, build_router};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if config.chat_api_key.is_none() {
        warn!("chat API key not set, /api/chat will answer 500 until configured");
    }
    if config.tts_api_key.is_none() {
        warn!("TTS API key not set, /api/tts will answer 500 until configured");
    }

    let app_state = AppState::new(config.proxy_config());
    let router = build_router(app_state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("voxgate listening on {}", bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
