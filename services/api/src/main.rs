mod config;
mod llm;
mod routes;

use crate::config::Config;
use crate::llm::OpenAiCompatibleClient;
use crate::routes::AppState;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    info!(
        "Using model {} at {}",
        config.chat_model, config.chat_api_base
    );
    let chat = OpenAiCompatibleClient::new(
        config.chat_api_base.clone(),
        config.chat_api_key.clone(),
        config.chat_model.clone(),
    );
    let app = routes::app(AppState {
        chat: Arc::new(chat),
    });

    info!("Starting interview backend, listening on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl-C, shutting down...");
        })
        .await?;

    Ok(())
}
