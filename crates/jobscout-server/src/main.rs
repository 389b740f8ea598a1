use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobscout_client::BackendProvider;
use jobscout_core::{ScrapeOrchestrator, ScraperConfig, SessionLimiter};
use jobscout_server::routes;
use jobscout_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ScraperConfig::from_env()?;
    let registry = Arc::new(config.load_registry()?);
    let limiter = SessionLimiter::new(config.max_browsers);
    let provider = BackendProvider::from_config(&config)?;

    tracing::info!(
        max_browsers = limiter.capacity(),
        sources = ?registry.ids(),
        "Scraper configured"
    );

    let state = Arc::new(AppState {
        orchestrator: ScrapeOrchestrator::new(
            provider,
            registry,
            limiter.clone(),
            config.orchestrator_config(),
        ),
        default_max_results: config.default_max_results,
    });

    let app = routes::router(Arc::clone(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.orchestrator.shutdown();
    tracing::info!(in_use = limiter.in_use(), "Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
