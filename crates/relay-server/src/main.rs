mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Result;
use dotenv::dotenv;
use relay::{
    completion::CompletionExchange, coordinator::RunCompletionCoordinator,
    providers::openai::OpenAiProvider,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let settings = configuration::Settings::new()?;

    // One client shared by both exchanges
    let provider = Arc::new(OpenAiProvider::new(settings.openai.provider_config())?);
    let coordinator = RunCompletionCoordinator::new(
        provider.clone(),
        settings.openai.assistant_id.clone(),
        settings.polling.poll_policy(),
    );
    let completion = CompletionExchange::new(provider, settings.openai.model.clone());

    let shutdown = CancellationToken::new();
    let state = state::AppState::new(coordinator, completion, shutdown.clone());

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

// Resolves on ctrl-c, after cancelling every in-flight exchange
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down, cancelling in-flight exchanges");
    shutdown.cancel();
}
