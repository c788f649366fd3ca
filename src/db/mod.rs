use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub mod store;

use crate::error::RelayError;
pub use store::{AuditStore, DeploymentRecord};

/// Initialize the SQLite database at a filesystem path and run migrations
pub async fn init_db(db_path: impl AsRef<Path>) -> Result<SqlitePool, RelayError> {
    let db_path = db_path.as_ref();
    let db_path_str = db_path.to_string_lossy();

    // Ensure the database file exists or create it
    if !db_path.exists() {
        info!("Database file not found at {}, creating...", db_path_str);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelayError::DatabaseError(format!("Failed to create database directory: {}", e))
            })?;
        }
        std::fs::File::create(db_path).map_err(|e| {
            RelayError::DatabaseError(format!("Failed to create database file: {}", e))
        })?;
    }

    init_db_from_url(&format!("sqlite:{}", db_path_str)).await
}

/// Initialize a SQLite connection pool from a database URL and run migrations
pub async fn init_db_from_url(db_url: &str) -> Result<SqlitePool, RelayError> {
    info!("Connecting to database at {}", db_url);

    // An in-memory database exists per connection; a single-connection pool
    // keeps every query on the same database.
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await
        .map_err(|e| RelayError::ConfigError(format!("Failed to connect to database: {}", e)))?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| RelayError::ConfigError(format!("Failed to run migrations: {}", e)))?;

    info!("Database initialized successfully");
    Ok(pool)
}
