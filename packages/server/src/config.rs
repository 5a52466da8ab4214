use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Collection ids for the Appwrite database.
///
/// Passed explicitly into the migration runner and ledger instead of
/// being read from the environment at use sites.
#[derive(Debug, Clone)]
pub struct Collections {
    pub clientes: String,
    pub citas: String,
    pub migration_logs: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub appwrite_endpoint: String,
    pub appwrite_project_id: String,
    pub appwrite_api_key: String,
    pub database_id: String,
    pub collections: Collections,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            appwrite_endpoint: env::var("APPWRITE_ENDPOINT")
                .context("APPWRITE_ENDPOINT must be set")?,
            appwrite_project_id: env::var("APPWRITE_PROJECT_ID")
                .context("APPWRITE_PROJECT_ID must be set")?,
            appwrite_api_key: env::var("APPWRITE_API_KEY")
                .context("APPWRITE_API_KEY must be set")?,
            database_id: env::var("APPWRITE_DATABASE_ID")
                .context("APPWRITE_DATABASE_ID must be set")?,
            collections: Collections {
                clientes: env::var("APPWRITE_CLIENTS_COLLECTION_ID")
                    .unwrap_or_else(|_| "clientes".to_string()),
                citas: env::var("APPWRITE_CITAS_COLLECTION_ID")
                    .unwrap_or_else(|_| "citas".to_string()),
                migration_logs: env::var("APPWRITE_MIGRATION_LOGS_COLLECTION_ID")
                    .unwrap_or_else(|_| "migration_logs".to_string()),
            },
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }
}
