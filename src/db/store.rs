use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::RelayError;
use crate::payload::CanonicalPayload;

/// One relayed deployment request, as persisted.
///
/// The relay only ever inserts these; the `deployed` and `tested` flags are
/// owned by the downstream deployment workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: i64,
    pub commit: String,
    pub tag: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub repository: String,
    pub environment: String,
    pub deployed: bool,
    pub tested: bool,
}

// Helper struct to map DB row to DeploymentRecord
#[derive(FromRow)]
struct DeploymentRow {
    id: i64,
    commit_sha: String,
    tag: Option<String>,
    created_at: String,
    author: String,
    repository: String,
    environment: String,
    deployed: bool,
    tested: bool,
}

impl From<DeploymentRow> for DeploymentRecord {
    fn from(row: DeploymentRow) -> Self {
        let timestamp = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        DeploymentRecord {
            id: row.id,
            commit: row.commit_sha,
            tag: row.tag,
            timestamp,
            author: row.author,
            repository: row.repository,
            environment: row.environment,
            deployed: row.deployed,
            tested: row.tested,
        }
    }
}

/// Append-only audit log of relayed records, backed by SQLite
#[derive(Clone)]
pub struct AuditStore {
    pool: SqlitePool,
}

impl AuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one record, returning the assigned row id
    pub async fn record(&self, payload: &CanonicalPayload) -> Result<i64, RelayError> {
        let result = sqlx::query(
            r#"
            INSERT INTO deployments (
                commit_sha, tag, created_at, author,
                repository, environment, deployed, tested
            )
            VALUES (?, ?, ?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(&payload.commit)
        .bind(&payload.tag)
        .bind(Utc::now().to_rfc3339())
        .bind(&payload.author)
        .bind(&payload.repository)
        .bind(&payload.environment)
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::DatabaseError(format!("Failed to insert deployment: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Get a record by ID
    pub async fn get(&self, id: i64) -> Result<Option<DeploymentRecord>, RelayError> {
        let row = sqlx::query_as::<_, DeploymentRow>(
            r#"
            SELECT
                id, commit_sha, tag, created_at, author,
                repository, environment, deployed, tested
            FROM deployments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelayError::DatabaseError(format!("Failed to fetch deployment: {}", e)))?;

        Ok(row.map(|r| r.into()))
    }

    /// Count all persisted records
    pub async fn count(&self) -> Result<i64, RelayError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM deployments")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                RelayError::DatabaseError(format!("Failed to count deployments: {}", e))
            })?;

        Ok(count.0)
    }

    /// Get recent records, newest first
    pub async fn recent(&self, limit: i64) -> Result<Vec<DeploymentRecord>, RelayError> {
        let rows = sqlx::query_as::<_, DeploymentRow>(
            r#"
            SELECT
                id, commit_sha, tag, created_at, author,
                repository, environment, deployed, tested
            FROM deployments
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            RelayError::DatabaseError(format!("Failed to fetch recent deployments: {}", e))
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
