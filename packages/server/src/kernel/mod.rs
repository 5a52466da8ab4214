//! Kernel-level infrastructure for the migration service.
//!
//! Holds the pieces that are generic over any particular migration:
//! - [`DocumentStore`] - trait over the backing document database
//! - [`AppwriteStore`] - production implementation backed by Appwrite
//! - [`retry_with_backoff`] - rate-limit-aware retry wrapper
//! - [`Pager`] / [`build_lookup`] - offset/limit batch pagination
//!
//! Business logic (which field to derive, from what) stays in
//! `data_migrations` - this module only provides the infrastructure.

pub mod paginate;
pub mod retry;
pub mod store;
pub mod test_dependencies;

pub use paginate::{build_lookup, Pager};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use store::{AppwriteStore, DocumentPage, DocumentStore, StoreError};
