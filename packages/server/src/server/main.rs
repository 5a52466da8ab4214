// Main entry point for the migration API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::data_migrations::RunnerConfig;
use server_core::kernel::AppwriteStore;
use server_core::server::build_app;
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lipoout migration API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        endpoint = %config.appwrite_endpoint,
        database = %config.database_id,
        "Configuration loaded"
    );

    // Connect to Appwrite
    let client = appwrite::Client::new(
        config.appwrite_endpoint.clone(),
        config.appwrite_project_id.clone(),
        config.appwrite_api_key.clone(),
    );
    let store = Arc::new(AppwriteStore::new(client, config.database_id.clone()));

    // Build application
    let app = build_app(store, config.collections.clone(), RunnerConfig::default());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
