//! SQLite-backed job store

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};
use uuid::Uuid;

use super::store::{JobStore, JobStoreError};
use crate::domain::{AnalysisJob, AnalysisKind, JobStatus};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS analyses (
    id TEXT PRIMARY KEY NOT NULL,
    filename TEXT NOT NULL,
    status TEXT NOT NULL,
    upload_time TEXT NOT NULL,
    completion_time TEXT,
    analysis_kind TEXT NOT NULL DEFAULT 'file',
    file_hash TEXT,
    execution_info TEXT
)
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_analyses_upload_time ON analyses (upload_time)";

const SELECT_COLUMNS: &str = "SELECT id, filename, status, upload_time, completion_time, \
     analysis_kind, file_hash, execution_info FROM analyses";

/// Durable job store on a single SQLite database file
#[derive(Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Open (creating if needed) the database file and the `analyses` table.
    pub async fn connect(database_path: impl AsRef<Path>) -> Result<Self, JobStoreError> {
        let path = database_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| JobStoreError::Database(format!("{}: {}", parent.display(), e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.migrate().await?;

        info!(database = %path.display(), "SQLite job store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), JobStoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        sqlx::query(CREATE_INDEX)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    fn ensure_updated(id: Uuid, rows_affected: u64) -> Result<(), JobStoreError> {
        if rows_affected == 0 {
            return Err(JobStoreError::NotFound(id));
        }
        Ok(())
    }
}

fn db_error(e: sqlx::Error) -> JobStoreError {
    JobStoreError::Database(e.to_string())
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, JobStoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| JobStoreError::Corrupt(format!("timestamp '{}': {}", value, e)))
}

fn job_from_row(row: &SqliteRow) -> Result<AnalysisJob, JobStoreError> {
    let id: String = row.try_get("id").map_err(db_error)?;
    let status: String = row.try_get("status").map_err(db_error)?;
    let upload_time: String = row.try_get("upload_time").map_err(db_error)?;
    let completion_time: Option<String> = row.try_get("completion_time").map_err(db_error)?;
    let analysis_kind: String = row.try_get("analysis_kind").map_err(db_error)?;
    let execution_info: Option<String> = row.try_get("execution_info").map_err(db_error)?;

    Ok(AnalysisJob {
        id: Uuid::parse_str(&id)
            .map_err(|e| JobStoreError::Corrupt(format!("id '{}': {}", id, e)))?,
        filename: row.try_get("filename").map_err(db_error)?,
        status: JobStatus::from_str(&status)
            .map_err(|e| JobStoreError::Corrupt(format!("status: {}", e)))?,
        upload_time: parse_time(&upload_time)?,
        completion_time: completion_time.as_deref().map(parse_time).transpose()?,
        analysis_kind: AnalysisKind::from_str(&analysis_kind)
            .map_err(|e| JobStoreError::Corrupt(format!("analysis_kind: {}", e)))?,
        file_hash: row.try_get("file_hash").map_err(db_error)?,
        execution_info: execution_info
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| JobStoreError::Corrupt(format!("execution_info: {}", e)))?,
    })
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create(&self, job: &AnalysisJob) -> Result<(), JobStoreError> {
        let execution_info = job
            .execution_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| JobStoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO analyses (id, filename, status, upload_time, completion_time, \
             analysis_kind, file_hash, execution_info) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.to_string())
        .bind(&job.filename)
        .bind(job.status.as_str())
        .bind(format_time(&job.upload_time))
        .bind(job.completion_time.as_ref().map(format_time))
        .bind(job.analysis_kind.as_str())
        .bind(job.file_hash.as_deref())
        .bind(execution_info)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(job_id = %job.id, "Job record created");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(JobStoreError::AlreadyExists(job.id))
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisJob>, JobStoreError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<AnalysisJob>, JobStoreError> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY upload_time DESC, rowid DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(job_from_row).collect()
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<AnalysisJob>, JobStoreError> {
        let rows = sqlx::query(&format!(
            "{} WHERE status = ? ORDER BY upload_time DESC, rowid DESC",
            SELECT_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(job_from_row).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        completion_time: Option<DateTime<Utc>>,
    ) -> Result<(), JobStoreError> {
        let result = sqlx::query("UPDATE analyses SET status = ?, completion_time = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(completion_time.as_ref().map(format_time))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Self::ensure_updated(id, result.rows_affected())
    }

    async fn set_file_hash(&self, id: Uuid, file_hash: Option<&str>) -> Result<(), JobStoreError> {
        let result = sqlx::query("UPDATE analyses SET file_hash = ? WHERE id = ?")
            .bind(file_hash)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Self::ensure_updated(id, result.rows_affected())
    }

    async fn set_execution_info(
        &self,
        id: Uuid,
        execution_info: Option<&serde_json::Value>,
    ) -> Result<(), JobStoreError> {
        let serialized = execution_info
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| JobStoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query("UPDATE analyses SET execution_info = ? WHERE id = ?")
            .bind(serialized)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Self::ensure_updated(id, result.rows_affected())
    }
}
