//! Migration job ledger.
//!
//! Each asynchronous migration run persists one record in the
//! `migration_logs` collection so callers can poll progress instead of
//! blocking on the HTTP response. Lifecycle is strictly
//! `running -> completed` or `running -> failed`; terminal states are
//! final and each job record is written exactly twice (create + close).

use anyhow::Result;
use appwrite::Document;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::runner::BackfillReport;
use crate::config::Collections;
use crate::kernel::DocumentStore;

/// Status of a migration job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Running,
        }
    }
}

/// One migration run's ledger record.
#[derive(Debug, Clone)]
pub struct MigrationJob {
    pub id: String,
    pub migration_type: String,
    pub status: JobStatus,
    pub total_records: u64,
    pub processed_records: u64,
    pub successful_records: u64,
    pub failed_records: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl MigrationJob {
    /// Persist a new job with status `running` and zeroed counters,
    /// returning it with its freshly generated id.
    pub async fn create(
        store: &dyn DocumentStore,
        collections: &Collections,
        migration_type: &str,
    ) -> Result<Self> {
        let job = Self {
            id: Uuid::new_v4().simple().to_string(),
            migration_type: migration_type.to_string(),
            status: JobStatus::Running,
            total_records: 0,
            processed_records: 0,
            successful_records: 0,
            failed_records: 0,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        };

        store
            .create(&collections.migration_logs, &job.id, job.to_data())
            .await?;
        Ok(job)
    }

    /// Close the job as completed with the run's final counters.
    pub async fn complete(
        mut self,
        store: &dyn DocumentStore,
        collections: &Collections,
        report: BackfillReport,
    ) -> Result<()> {
        self.status = JobStatus::Completed;
        self.total_records = report.total;
        self.processed_records = report.total_updated + report.total_errors;
        self.successful_records = report.total_updated;
        self.failed_records = report.total_errors;
        self.completed_at = Some(Utc::now());

        store
            .update(&collections.migration_logs, &self.id, self.to_data())
            .await?;
        Ok(())
    }

    /// Close the job as failed with the fatal error's message.
    ///
    /// Callers treat a failure of this update itself as best-effort:
    /// log it and move on, leaving the record stale at `running`.
    pub async fn fail(
        mut self,
        store: &dyn DocumentStore,
        collections: &Collections,
        error_message: &str,
    ) -> Result<()> {
        self.status = JobStatus::Failed;
        self.error_message = Some(error_message.to_string());
        self.completed_at = Some(Utc::now());

        store
            .update(&collections.migration_logs, &self.id, self.to_data())
            .await?;
        Ok(())
    }

    /// Read a job back from its ledger document.
    pub async fn find_by_id(
        store: &dyn DocumentStore,
        collections: &Collections,
        id: &str,
    ) -> Result<Self> {
        let doc = store.get(&collections.migration_logs, id).await?;
        Ok(Self::from_document(&doc))
    }

    fn to_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("migration_type".into(), json!(self.migration_type));
        data.insert("status".into(), json!(self.status.as_str()));
        data.insert("total_records".into(), json!(self.total_records));
        data.insert("processed_records".into(), json!(self.processed_records));
        data.insert("successful_records".into(), json!(self.successful_records));
        data.insert("failed_records".into(), json!(self.failed_records));
        data.insert("started_at".into(), json!(self.started_at.to_rfc3339()));
        data.insert(
            "completed_at".into(),
            json!(self.completed_at.map(|t| t.to_rfc3339())),
        );
        data.insert("error_message".into(), json!(self.error_message));
        data
    }

    fn from_document(doc: &Document) -> Self {
        let count = |key: &str| {
            doc.data
                .get(key)
                .and_then(Value::as_u64)
                .unwrap_or_default()
        };
        let timestamp = |key: &str| {
            doc.get_str(key)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc))
        };

        Self {
            id: doc.id.clone(),
            migration_type: doc.get_str("migration_type").unwrap_or_default().to_string(),
            status: JobStatus::from_str(doc.get_str("status").unwrap_or_default()),
            total_records: count("total_records"),
            processed_records: count("processed_records"),
            successful_records: count("successful_records"),
            failed_records: count("failed_records"),
            started_at: timestamp("started_at").unwrap_or_else(Utc::now),
            completed_at: timestamp("completed_at"),
            error_message: doc.get_str("error_message").map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::InMemoryStore;

    fn collections() -> Collections {
        Collections {
            clientes: "clientes".to_string(),
            citas: "citas".to_string(),
            migration_logs: "migration_logs".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_persists_a_running_job() {
        let store = InMemoryStore::new();
        let collections = collections();

        let job = MigrationJob::create(&store, &collections, "all").await.unwrap();
        assert!(!job.id.is_empty());
        assert_eq!(job.status, JobStatus::Running);

        let found = MigrationJob::find_by_id(&store, &collections, &job.id)
            .await
            .unwrap();
        assert_eq!(found.status, JobStatus::Running);
        assert_eq!(found.migration_type, "all");
        assert_eq!(found.total_records, 0);
        assert!(found.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_complete_records_final_counters() {
        let store = InMemoryStore::new();
        let collections = collections();

        let job = MigrationJob::create(&store, &collections, "search_unified")
            .await
            .unwrap();
        let id = job.id.clone();

        job.complete(
            &store,
            &collections,
            BackfillReport {
                total_updated: 40,
                total_errors: 2,
                total: 42,
            },
        )
        .await
        .unwrap();

        let found = MigrationJob::find_by_id(&store, &collections, &id).await.unwrap();
        assert_eq!(found.status, JobStatus::Completed);
        assert_eq!(found.total_records, 42);
        assert_eq!(found.processed_records, 42);
        assert_eq!(found.successful_records, 40);
        assert_eq!(found.failed_records, 2);
        assert!(found.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_fail_records_the_error_message() {
        let store = InMemoryStore::new();
        let collections = collections();

        let job = MigrationJob::create(&store, &collections, "cliente_nombre")
            .await
            .unwrap();
        let id = job.id.clone();

        job.fail(&store, &collections, "count query failed").await.unwrap();

        let found = MigrationJob::find_by_id(&store, &collections, &id).await.unwrap();
        assert_eq!(found.status, JobStatus::Failed);
        assert_eq!(found.error_message.as_deref(), Some("count query failed"));
        assert!(found.completed_at.is_some());
    }

    #[test]
    fn test_status_round_trips() {
        for status in [JobStatus::Running, JobStatus::Completed, JobStatus::Failed] {
            assert_eq!(JobStatus::from_str(status.as_str()), status);
        }
    }
}
