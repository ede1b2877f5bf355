use std::sync::Arc;

use anyhow::Context;
use clipcraft_client::routes::{create_routes, ConsoleState};
use clipcraft_client::{Config, HttpJobClient, JobController};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clipcraft_client=info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Clip backend: {}", config.backend_url);
    tracing::info!("Bounds policy: {:?}", config.bounds_policy);

    let client = HttpJobClient::from_config(&config).context("Failed to build HTTP client")?;
    let controller = Arc::new(JobController::new(Arc::new(client), config.bounds_policy));

    let app = create_routes(ConsoleState {
        controller: controller.clone(),
        backend_url: config.backend_url.clone(),
    })
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    tracing::info!("Listening on {}", config.listen_addr);
    axum::Server::try_bind(&config.listen_addr)
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Console server failed")?;

    controller.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received CTRL+C signal, shutting down...");
}
