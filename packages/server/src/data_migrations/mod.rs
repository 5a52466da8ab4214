//! Field backfill framework for Appwrite collections
//!
//! This module provides the infrastructure for walking every document
//! of a collection, deriving a new field value from existing fields,
//! and writing it back with rate-limit-aware retries and a final
//! progress report.
//!
//! # Architecture
//!
//! Backfills are different from schema changes: the collections and
//! attributes already exist, only the derived values are (re)computed.
//! The same [`BackfillRunner`] drives every backfill; each migration
//! only supplies its target collection, its write field and a pure
//! derive function via the [`FieldBackfill`] trait.
//!
//! # Usage
//!
//! 1. Implement the `FieldBackfill` trait for your backfill
//! 2. Register it in `all_backfills`
//! 3. Run via `migrate_cli run <name>` or `POST /migrations`

pub mod backfills;
pub mod derive;
pub mod ledger;
mod runner;

pub use backfills::{ClienteNombreBackfill, SearchUnifiedBackfill};
pub use ledger::{JobStatus, MigrationJob};
pub use runner::{BackfillReport, BackfillRunner, ProgressFn, RunnerConfig};

use std::collections::HashMap;

use appwrite::Document;

use crate::config::Collections;

/// Preloaded related-collection documents, keyed by id.
pub type Lookup = HashMap<String, Document>;

/// One derived-field backfill over a collection.
///
/// Implementations must be:
/// - Pure in `derive`: same document (and lookup) in, same value out
/// - Idempotent: re-running over unchanged data rewrites identical values
pub trait FieldBackfill: Send + Sync + 'static {
    /// Unique name (doubles as the ledger's `migration_type`).
    fn name(&self) -> &'static str;

    /// Optional description shown in the CLI listing.
    fn description(&self) -> &'static str {
        ""
    }

    /// Collection whose documents receive the derived field.
    fn collection<'a>(&self, collections: &'a Collections) -> &'a str;

    /// Related collection to preload into a lookup table, when the
    /// deriver joins against another collection.
    fn lookup_collection<'a>(&self, _collections: &'a Collections) -> Option<&'a str> {
        None
    }

    /// Attribute the derived value is written to.
    fn write_field(&self) -> &'static str;

    /// Derive the new field value for one document.
    ///
    /// `None` means a required related document is missing; the runner
    /// counts it as an error and skips the write without aborting.
    fn derive(&self, doc: &Document, lookup: Option<&Lookup>) -> Option<String>;
}

/// All registered backfills, in the order `all` runs them.
pub fn all_backfills() -> Vec<Box<dyn FieldBackfill>> {
    vec![
        Box::new(SearchUnifiedBackfill),
        Box::new(ClienteNombreBackfill),
    ]
}

/// Find a backfill by name.
pub fn find_backfill(name: &str) -> Option<Box<dyn FieldBackfill>> {
    all_backfills().into_iter().find(|b| b.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_knows_both_backfills() {
        let names: Vec<&str> = all_backfills().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["search_unified", "cliente_nombre"]);
    }

    #[test]
    fn test_find_backfill_by_name() {
        assert!(find_backfill("search_unified").is_some());
        assert!(find_backfill("cliente_nombre").is_some());
        assert!(find_backfill("nope").is_none());
    }
}
