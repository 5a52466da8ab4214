//! CLI for executing field backfills synchronously.
//!
//! This is the operator-driven variant of the migration service: the
//! run happens in the foreground with progress streamed to stdout as
//! JSON lines, one per successful update batch. Output is
//! machine-readable so wrapper tooling can render percentages.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use server_core::data_migrations::{
    all_backfills, find_backfill, BackfillRunner, MigrationJob, RunnerConfig,
};
use server_core::kernel::AppwriteStore;
use server_core::Config;

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Field backfill CLI for the clinic's Appwrite collections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registered backfills
    List,

    /// Count the documents a backfill would visit
    Estimate { name: String },

    /// Run a backfill to exhaustion, streaming progress
    Run {
        name: String,
        /// Page size for the target collection
        #[arg(long, default_value_t = 25)]
        page_size: u64,
    },

    /// Look up a migration job's ledger record
    Status { id: String },
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backfills: Option<Vec<BackfillInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ReportResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job: Option<JobStatusResponse>,
}

#[derive(Serialize)]
struct BackfillInfo {
    name: String,
    description: Option<String>,
}

#[derive(Serialize)]
struct ReportResponse {
    total_updated: u64,
    total_errors: u64,
    total: u64,
}

#[derive(Serialize)]
struct JobStatusResponse {
    migration_id: String,
    migration_type: String,
    status: String,
    total_records: u64,
    processed_records: u64,
    successful_records: u64,
    failed_records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

#[derive(Serialize)]
struct ProgressUpdate {
    #[serde(rename = "type")]
    update_type: String,
    current: u64,
    total: u64,
}

fn output(resp: &Response) {
    if let Ok(line) = serde_json::to_string(resp) {
        println!("{line}");
    }
}

fn failure(message: String) -> Response {
    Response {
        success: false,
        message: Some(message),
        count: None,
        backfills: None,
        report: None,
        job: None,
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => cmd_list(),
        Commands::Estimate { name } => cmd_estimate(&name).await,
        Commands::Run { name, page_size } => cmd_run(&name, page_size).await,
        Commands::Status { id } => cmd_status(&id).await,
    }
}

fn store_from_env() -> Result<(Arc<AppwriteStore>, Config)> {
    let config = Config::from_env()?;
    let client = appwrite::Client::new(
        config.appwrite_endpoint.clone(),
        config.appwrite_project_id.clone(),
        config.appwrite_api_key.clone(),
    );
    let store = Arc::new(AppwriteStore::new(client, config.database_id.clone()));
    Ok((store, config))
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_list() -> Result<()> {
    let backfills: Vec<BackfillInfo> = all_backfills()
        .into_iter()
        .map(|b| BackfillInfo {
            name: b.name().to_string(),
            description: {
                let desc = b.description();
                if desc.is_empty() {
                    None
                } else {
                    Some(desc.to_string())
                }
            },
        })
        .collect();

    output(&Response {
        success: true,
        message: None,
        count: None,
        backfills: Some(backfills),
        report: None,
        job: None,
    });

    Ok(())
}

async fn cmd_estimate(name: &str) -> Result<()> {
    let Some(backfill) = find_backfill(name) else {
        output(&failure(format!("Backfill '{name}' not found")));
        return Ok(());
    };

    let (store, config) = store_from_env()?;
    let runner = BackfillRunner::new(store, config.collections);
    let count = runner
        .estimate(backfill.as_ref())
        .await
        .context("Failed to estimate backfill size")?;

    output(&Response {
        success: true,
        message: None,
        count: Some(count),
        backfills: None,
        report: None,
        job: None,
    });

    Ok(())
}

async fn cmd_run(name: &str, page_size: u64) -> Result<()> {
    let Some(backfill) = find_backfill(name) else {
        output(&failure(format!("Backfill '{name}' not found")));
        return Ok(());
    };

    let (store, config) = store_from_env()?;
    let runner_config = RunnerConfig {
        page_size,
        ..RunnerConfig::default()
    };
    let runner = BackfillRunner::with_config(store, config.collections, runner_config);

    let on_progress = |current: u64, total: u64| {
        let update = ProgressUpdate {
            update_type: "progress".to_string(),
            current,
            total,
        };
        if let Ok(line) = serde_json::to_string(&update) {
            println!("{line}");
        }
    };

    match runner.run(backfill.as_ref(), Some(&on_progress)).await {
        Ok(report) => {
            output(&Response {
                success: true,
                message: Some(format!(
                    "Updated: {}, Errors: {}",
                    report.total_updated, report.total_errors
                )),
                count: None,
                backfills: None,
                report: Some(ReportResponse {
                    total_updated: report.total_updated,
                    total_errors: report.total_errors,
                    total: report.total,
                }),
                job: None,
            });
        }
        Err(e) => {
            output(&failure(format!("Backfill failed: {e:#}")));
        }
    }

    Ok(())
}

async fn cmd_status(id: &str) -> Result<()> {
    let (store, config) = store_from_env()?;

    match MigrationJob::find_by_id(store.as_ref(), &config.collections, id).await {
        Ok(job) => {
            output(&Response {
                success: true,
                message: None,
                count: None,
                backfills: None,
                report: None,
                job: Some(JobStatusResponse {
                    migration_id: job.id,
                    migration_type: job.migration_type,
                    status: job.status.as_str().to_string(),
                    total_records: job.total_records,
                    processed_records: job.processed_records,
                    successful_records: job.successful_records,
                    failed_records: job.failed_records,
                    error_message: job.error_message,
                }),
            });
        }
        Err(e) => {
            output(&failure(format!("Job '{id}' not found: {e}")));
        }
    }

    Ok(())
}
