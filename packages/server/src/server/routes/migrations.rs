//! Migration endpoints: asynchronous acceptance + ledger polling.
//!
//! `POST /migrations` persists a ledger record, spawns the actual run
//! as a detached background task and answers 202 immediately; callers
//! poll `GET /migrations/{id}` for the outcome. There is no cancel
//! operation, and nothing stops two jobs of the same type from running
//! concurrently against the same collection.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::data_migrations::{
    BackfillReport, BackfillRunner, ClienteNombreBackfill, FieldBackfill, MigrationJob,
    SearchUnifiedBackfill,
};
use crate::server::app::AppState;

/// Which backfill(s) a request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationType {
    SearchUnified,
    ClienteNombre,
    All,
}

impl Default for MigrationType {
    fn default() -> Self {
        Self::All
    }
}

impl MigrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchUnified => "search_unified",
            Self::ClienteNombre => "cliente_nombre",
            Self::All => "all",
        }
    }

    /// The backfills to run, in order.
    fn backfills(&self) -> Vec<Box<dyn FieldBackfill>> {
        match self {
            Self::SearchUnified => vec![Box::new(SearchUnifiedBackfill)],
            Self::ClienteNombre => vec![Box::new(ClienteNombreBackfill)],
            Self::All => vec![Box::new(SearchUnifiedBackfill), Box::new(ClienteNombreBackfill)],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartMigrationRequest {
    #[serde(rename = "type", default)]
    pub migration_type: MigrationType,
}

/// Start a migration job.
///
/// Returns 202 with the job id before any document is processed, 400
/// if the payload names an unknown migration type, or 500 if the
/// ledger record itself could not be created.
pub async fn start_migration_handler(
    Extension(state): Extension<AppState>,
    request: Result<Json<StartMigrationRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    // Bad payloads never reach the ledger.
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": rejection.body_text() })),
            );
        }
    };
    let migration_type = request.migration_type;

    let job = match MigrationJob::create(
        state.store.as_ref(),
        &state.collections,
        migration_type.as_str(),
    )
    .await
    {
        Ok(job) => job,
        Err(e) => {
            error!(error = %e, "failed to create migration job record");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            );
        }
    };

    let migration_id = job.id.clone();
    tokio::spawn(run_migration_job(state, job, migration_type));

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "ok": true,
            "migrationId": migration_id,
            "type": migration_type.as_str(),
            "status": "running",
        })),
    )
}

/// The detached background task behind one accepted job.
async fn run_migration_job(state: AppState, job: MigrationJob, migration_type: MigrationType) {
    let runner = BackfillRunner::with_config(
        state.store.clone(),
        state.collections.clone(),
        state.runner_config.clone(),
    );

    let mut combined = BackfillReport::default();
    let mut failure = None;
    for backfill in migration_type.backfills() {
        match runner.run(backfill.as_ref(), None).await {
            Ok(report) => combined = combined.merge(report),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    let outcome = match failure {
        None => job.complete(state.store.as_ref(), &state.collections, combined).await,
        Some(e) => {
            job.fail(state.store.as_ref(), &state.collections, &format!("{e:#}"))
                .await
        }
    };

    // Best effort: a job whose closing update fails stays at `running`
    // and pollers have to treat it as stale.
    if let Err(e) = outcome {
        error!(error = %e, "failed to record migration outcome in ledger");
    }
}

/// Poll a migration job's ledger record.
pub async fn get_migration_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match MigrationJob::find_by_id(state.store.as_ref(), &state.collections, &id).await {
        Ok(job) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "migrationId": job.id,
                "type": job.migration_type,
                "status": job.status.as_str(),
                "total_records": job.total_records,
                "processed_records": job.processed_records,
                "successful_records": job.successful_records,
                "failed_records": job.failed_records,
                "started_at": job.started_at.to_rfc3339(),
                "completed_at": job.completed_at.map(|t| t.to_rfc3339()),
                "error_message": job.error_message,
            })),
        ),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "ok": false, "error": format!("migration job '{id}' not found") })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_type_defaults_to_all() {
        let request: StartMigrationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.migration_type, MigrationType::All);
    }

    #[test]
    fn test_migration_type_parses_wire_names() {
        let request: StartMigrationRequest =
            serde_json::from_str(r#"{"type": "search_unified"}"#).unwrap();
        assert_eq!(request.migration_type, MigrationType::SearchUnified);

        let request: StartMigrationRequest =
            serde_json::from_str(r#"{"type": "cliente_nombre"}"#).unwrap();
        assert_eq!(request.migration_type, MigrationType::ClienteNombre);
    }

    #[test]
    fn test_unknown_migration_type_is_rejected() {
        assert!(serde_json::from_str::<StartMigrationRequest>(r#"{"type": "bogus"}"#).is_err());
    }

    #[test]
    fn test_all_runs_both_backfills_in_order() {
        let names: Vec<&str> = MigrationType::All
            .backfills()
            .iter()
            .map(|b| b.name())
            .collect();
        assert_eq!(names, vec!["search_unified", "cliente_nombre"]);
    }
}
