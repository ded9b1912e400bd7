use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use widget_service::config::Config;
use widget_service::ratelimit::service::RateLimitService;
use widget_service::storage::memory::WidgetStore;
use widget_service::widgets::routes::router;
use widget_service::widgets::service::WidgetService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    config.validate()?;

    // 1. Storage and rate limiting:
    let store = Arc::new(WidgetStore::new());
    let limits = Arc::new(RateLimitService::new(&config.rate_limits()));
    tracing::info!("Rate limits: {:?}", limits.settings());

    // 2. HTTP router:
    let service = Arc::new(WidgetService::new(store, limits));
    let paging = config.paging();
    tracing::info!(
        "Paging: default {} per page, at most {}",
        paging.default_per_page,
        paging.max_per_page
    );
    let app = router(service, paging);

    // 3. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
