//! End-to-end tests for the migration HTTP surface, running the full
//! router against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use server_core::config::Collections;
use server_core::data_migrations::RunnerConfig;
use server_core::kernel::test_dependencies::InMemoryStore;
use server_core::kernel::DocumentStore;
use server_core::server::build_app;

fn collections() -> Collections {
    Collections {
        clientes: "clientes".to_string(),
        citas: "citas".to_string(),
        migration_logs: "migration_logs".to_string(),
    }
}

fn test_app(store: Arc<InMemoryStore>) -> Router {
    build_app(store, collections(), RunnerConfig::default())
}

fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.insert(
        "clientes",
        "c-0",
        json!({ "nombre_completo": "Ana García", "tel1cli": "600111222" }),
    );
    store.insert("clientes", "c-1", json!({ "nomcli": "Luis", "ape1cli": "Pérez" }));
    store.insert("citas", "a-0", json!({ "cliente_id": "c-0" }));
    store.insert("citas", "a-1", json!({ "cliente_id": "c-1" }));
    store
}

async fn post_migrations(app: &Router, payload: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::post("/migrations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Poll the job until it leaves `running` (the paused clock makes the
/// runner's delays complete instantly).
async fn wait_for_outcome(app: &Router, id: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = get_json(app, &format!("/migrations/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] != "running" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("migration job never finished");
}

#[tokio::test(start_paused = true)]
async fn test_start_migration_returns_202_immediately() {
    let app = test_app(seeded_store());

    let (status, body) = post_migrations(&app, json!({ "type": "all" })).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "running");
    assert_eq!(body["type"], "all");
    assert!(!body["migrationId"].as_str().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_all_migration_backfills_both_collections() {
    let store = seeded_store();
    let app = test_app(store.clone());

    let (_, accepted) = post_migrations(&app, json!({ "type": "all" })).await;
    let id = accepted["migrationId"].as_str().unwrap().to_string();

    let outcome = wait_for_outcome(&app, &id).await;
    assert_eq!(outcome["status"], "completed");
    // 2 clientes + 2 citas
    assert_eq!(outcome["total_records"], 4);
    assert_eq!(outcome["successful_records"], 4);
    assert_eq!(outcome["failed_records"], 0);
    assert!(outcome["completed_at"].is_string());

    assert_eq!(
        store.field("clientes", "c-0", "search_unified").unwrap(),
        "ana garcía 600111222"
    );
    assert_eq!(
        store.field("citas", "a-1", "cliente_nombre").unwrap(),
        "Luis Pérez"
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_type_only_touches_its_collection() {
    let store = seeded_store();
    let app = test_app(store.clone());

    let (_, accepted) = post_migrations(&app, json!({ "type": "search_unified" })).await;
    let id = accepted["migrationId"].as_str().unwrap().to_string();

    let outcome = wait_for_outcome(&app, &id).await;
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["total_records"], 2);

    assert!(store.field("clientes", "c-0", "search_unified").is_some());
    assert!(store.field("citas", "a-0", "cliente_nombre").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_fatal_run_error_marks_the_job_failed() {
    let store = seeded_store();
    // The cliente_nombre lookup build needs to list clientes
    store.fail_lists("clientes");
    let app = test_app(store);

    let (status, accepted) = post_migrations(&app, json!({ "type": "cliente_nombre" })).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let id = accepted["migrationId"].as_str().unwrap().to_string();
    let outcome = wait_for_outcome(&app, &id).await;
    assert_eq!(outcome["status"], "failed");
    assert!(outcome["error_message"].as_str().unwrap().contains("clientes"));
}

#[tokio::test(start_paused = true)]
async fn test_ledger_create_failure_returns_500() {
    let store = seeded_store();
    store.fail_creates("migration_logs");
    let app = test_app(store);

    let (status, body) = post_migrations(&app, json!({ "type": "all" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_migration_type_returns_400_without_a_ledger_record() {
    let store = seeded_store();
    let app = test_app(store.clone());

    let (status, body) = post_migrations(&app, json!({ "type": "bogus" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());

    // The bad request never touched the ledger
    let ledger = store.list("migration_logs", 1, 0).await.unwrap();
    assert_eq!(ledger.total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_job_id_returns_404() {
    let app = test_app(seeded_store());

    let (status, body) = get_json(&app, "/migrations/no-such-job").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
}

#[tokio::test(start_paused = true)]
async fn test_health_reports_store_status() {
    let app = test_app(seeded_store());

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test(start_paused = true)]
async fn test_health_reports_unreachable_store_as_503() {
    let store = seeded_store();
    store.fail_lists("migration_logs");
    let app = test_app(store);

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["store"]["status"], "error");
    assert!(body["store"]["error"].is_string());
}
