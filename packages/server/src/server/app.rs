//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Collections;
use crate::data_migrations::RunnerConfig;
use crate::kernel::DocumentStore;
use crate::server::routes::{get_migration_handler, health_handler, start_migration_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub collections: Collections,
    pub runner_config: RunnerConfig,
}

/// Build the Axum application router.
///
/// The store is injected behind the [`DocumentStore`] trait so tests
/// can run the full HTTP surface against the in-memory fake.
pub fn build_app(
    store: Arc<dyn DocumentStore>,
    collections: Collections,
    runner_config: RunnerConfig,
) -> Router {
    let app_state = AppState {
        store,
        collections,
        runner_config,
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/migrations", post(start_migration_handler))
        .route("/migrations/:id", get(get_migration_handler))
        .route("/health", get(health_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
