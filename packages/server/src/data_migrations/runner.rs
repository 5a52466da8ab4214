//! Backfill runner: drives one [`FieldBackfill`] across its collection.
//!
//! ```text
//! BackfillRunner::run(backfill)
//!     │
//!     ├─► build_lookup(related collection)     (join backfills only)
//!     ├─► limit-1 list                         (total snapshot)
//!     └─► per page, per document:
//!             derive ─► update via retry_with_backoff ─► count + progress
//! ```
//!
//! Records are processed strictly sequentially; fixed inter-record and
//! inter-page delays keep steady-state traffic under the store's rate
//! limit, with the retrier handling the bursts that still get through.
//! A single document's unrecoverable failure never aborts the run -
//! only setup errors (lookup build, count query, page fetch) do.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::{FieldBackfill, Lookup};
use crate::config::Collections;
use crate::kernel::{build_lookup, retry_with_backoff, Pager, RetryPolicy};
use crate::kernel::{DocumentStore, StoreError};

/// Progress callback: `(updated so far, total at run start)`.
pub type ProgressFn = dyn Fn(u64, u64) + Send + Sync;

/// Log a progress line every this many successful updates.
const PROGRESS_LOG_EVERY: u64 = 25;

/// Tuning for one runner instance.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Page size for the collection being backfilled. Kept small so a
    /// page's worth of writes stays under the rate limit.
    pub page_size: u64,
    /// Page size when preloading the lookup collection (reads only).
    pub lookup_page_size: u64,
    /// Pause after each document's write.
    pub per_record_delay: Duration,
    /// Pause after each full page.
    pub per_page_delay: Duration,
    /// Backoff policy for individual writes.
    pub retry: RetryPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            lookup_page_size: 100,
            per_record_delay: Duration::from_millis(100),
            per_page_delay: Duration::from_millis(2000),
            retry: RetryPolicy::default(),
        }
    }
}

/// Final counters for one backfill run.
///
/// `total` is the point-in-time count taken at run start; concurrent
/// inserts or deletes can make it drift from updated + errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub total_updated: u64,
    pub total_errors: u64,
    pub total: u64,
}

impl BackfillReport {
    /// Sum counters across sub-runs (used by the `all` migration type).
    pub fn merge(self, other: Self) -> Self {
        Self {
            total_updated: self.total_updated + other.total_updated,
            total_errors: self.total_errors + other.total_errors,
            total: self.total + other.total,
        }
    }
}

/// Shared, parameterized runner replacing the per-migration copies the
/// front-end scripts and the serverless function used to carry.
pub struct BackfillRunner {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
    config: RunnerConfig,
}

impl BackfillRunner {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self::with_config(store, collections, RunnerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        collections: Collections,
        config: RunnerConfig,
    ) -> Self {
        Self {
            store,
            collections,
            config,
        }
    }

    /// Count of documents a run would visit (limit-1 list, total only).
    pub async fn estimate(&self, backfill: &dyn FieldBackfill) -> Result<u64> {
        let collection = backfill.collection(&self.collections);
        let page = self
            .store
            .list(collection, 1, 0)
            .await
            .with_context(|| format!("failed to count documents in {collection}"))?;
        Ok(page.total)
    }

    /// Run one backfill to exhaustion.
    ///
    /// `on_progress` is invoked after every successful write with the
    /// running updated count and the total snapshot.
    pub async fn run(
        &self,
        backfill: &dyn FieldBackfill,
        on_progress: Option<&ProgressFn>,
    ) -> Result<BackfillReport> {
        let name = backfill.name();
        let collection = backfill.collection(&self.collections);
        info!(migration = name, collection, "starting backfill");

        // The lookup must be complete before any document is processed,
        // otherwise joins silently miss.
        let lookup: Option<Lookup> = match backfill.lookup_collection(&self.collections) {
            Some(related) => {
                let lookup = build_lookup(self.store.as_ref(), related, self.config.lookup_page_size)
                    .await
                    .with_context(|| {
                        format!("failed to preload lookup collection {related}")
                    })?;
                info!(migration = name, related, loaded = lookup.len(), "lookup table loaded");
                Some(lookup)
            }
            None => None,
        };

        // Point-in-time total; only used for reporting and progress.
        let total = self.estimate(backfill).await?;
        info!(migration = name, total, "documents to process");

        let mut report = BackfillReport {
            total,
            ..Default::default()
        };

        let mut pager = Pager::new(self.store.as_ref(), collection, self.config.page_size);
        loop {
            let page = match pager.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) => {
                    error!(
                        migration = name,
                        processed = report.total_updated,
                        error = %e,
                        "page fetch failed, aborting run"
                    );
                    return Err(e).context("failed to fetch next page");
                }
            };

            for doc in &page {
                let Some(value) = backfill.derive(doc, lookup.as_ref()) else {
                    warn!(
                        migration = name,
                        document = %doc.id,
                        "related document missing, skipping"
                    );
                    report.total_errors += 1;
                    continue;
                };

                let mut data = Map::new();
                data.insert(backfill.write_field().to_string(), Value::String(value));

                let written = retry_with_backoff(&self.config.retry, StoreError::is_rate_limit, || {
                    self.store.update(collection, &doc.id, data.clone())
                })
                .await;

                match written {
                    Ok(_) => {
                        report.total_updated += 1;
                        if let Some(progress) = on_progress {
                            progress(report.total_updated, total);
                        }
                        if report.total_updated % PROGRESS_LOG_EVERY == 0 {
                            info!(
                                migration = name,
                                updated = report.total_updated,
                                total,
                                "backfill progress"
                            );
                        }
                    }
                    Err(e) => {
                        error!(
                            migration = name,
                            document = %doc.id,
                            error = %e,
                            "update failed, continuing with next document"
                        );
                        report.total_errors += 1;
                    }
                }

                tokio::time::sleep(self.config.per_record_delay).await;
            }

            tokio::time::sleep(self.config.per_page_delay).await;
        }

        info!(
            migration = name,
            updated = report.total_updated,
            errors = report.total_errors,
            total = report.total,
            "backfill completed"
        );
        Ok(report)
    }
}
