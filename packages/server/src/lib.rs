// Lipoout clinic backend - backfill migration core
//
// This crate hosts the batched backfill machinery for the clinic's
// Appwrite collections: the kernel (store access, retry, pagination),
// the data-migration framework (runner, derivers, job ledger) and the
// HTTP surface that starts and reports on migration jobs.

pub mod config;
pub mod data_migrations;
pub mod kernel;
pub mod server;

pub use config::*;
