//! Store creation and utility functions.

use std::path::PathBuf;
use std::sync::Arc;

use rolegate::store::{InMemory, RoleStore, SqlStore};

use crate::cli::{Backend, BackendArgs};

const SQLITE_FILE: &str = "rolegate.db";
const JSON_FILE: &str = "rolegate.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

fn data_dir(args: &BackendArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Create the appropriate store based on configuration
pub async fn create_store(
    args: &BackendArgs,
) -> Result<Arc<dyn RoleStore>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(args);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    match args.backend {
        Backend::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite backend at {}", db_path.display());
            Ok(Arc::new(SqlStore::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = args
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or ROLEGATE_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL backend at {}", display_url);

            match SqlStore::connect_postgres(url).await {
                Ok(store) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(store))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {}: {}", display_url, e).into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = data_dir.join(JSON_FILE);
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            // A missing file loads empty; an unreadable one is an error so it
            // is never overwritten on save
            let store = InMemory::load_from_file(&json_path).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Write an in-memory store back to its JSON file. Other stores are a no-op.
pub async fn persist(
    store: &dyn RoleStore,
    args: &BackendArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = store.as_any().downcast_ref::<InMemory>() {
        let json_path = data_dir(args).join(JSON_FILE);
        in_memory.save_to_file(&json_path).await?;
        tracing::info!("Store saved to {}", json_path.display());
    }
    Ok(())
}
