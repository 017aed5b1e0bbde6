//! SQLite repository for symptom log entries.

use crate::models::{NewSymptomLog, SymptomLog};
use crate::services::metrics::observe_db_query;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use service_core::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, user_id, symptom, severity, severity_score, started_at, \
     ended_at, duration_secs, treatment, location, notes, created_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the SQLite file at `path`.
    #[instrument(skip(path), fields(service = "healthtrack-service", path = %path.display()))]
    pub async fn new(path: &Path, max_connections: u32) -> Result<Self, AppError> {
        info!(max_connections = max_connections, "Opening SQLite database");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("SQLite connection pool established");

        Ok(Self { pool })
    }

    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Persist an entry and return its generated id.
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, severity = %entry.severity))]
    pub async fn add_log(&self, entry: &NewSymptomLog) -> Result<String, AppError> {
        let started = Instant::now();
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO symptom_logs (id, user_id, symptom, severity, severity_score, started_at,
                                      ended_at, duration_secs, treatment, location, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&entry.user_id)
        .bind(&entry.symptom)
        .bind(entry.severity)
        .bind(entry.severity_score)
        .bind(entry.started_at)
        .bind(entry.ended_at)
        .bind(entry.duration_secs)
        .bind(&entry.treatment)
        .bind(&entry.location)
        .bind(&entry.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert entry: {}", e)))?;

        observe_db_query("add_log", started);
        info!(entry_id = %id, "Symptom entry stored");

        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn get_log(&self, id: &str) -> Result<Option<SymptomLog>, AppError> {
        let started = Instant::now();

        let entry = sqlx::query_as::<_, SymptomLog>(&format!(
            "SELECT {} FROM symptom_logs WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch entry: {}", e)))?;

        observe_db_query("get_log", started);
        Ok(entry)
    }

    /// Entries for `user_id` in chronological order, optionally from `since` onwards.
    #[instrument(skip(self))]
    pub async fn list_logs(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SymptomLog>, AppError> {
        let started = Instant::now();

        let entries = sqlx::query_as::<_, SymptomLog>(&format!(
            "SELECT {} FROM symptom_logs \
             WHERE user_id = ? AND (? IS NULL OR started_at >= ?) \
             ORDER BY started_at ASC, created_at ASC",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .bind(since)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list entries: {}", e)))?;

        observe_db_query("list_logs", started);
        Ok(entries)
    }

    /// The newest `limit` entries that started within the last `days` days.
    #[instrument(skip(self))]
    pub async fn summarize_window(
        &self,
        user_id: &str,
        days: u32,
        limit: usize,
    ) -> Result<Vec<SymptomLog>, AppError> {
        let started = Instant::now();
        let window_start = Utc::now() - ChronoDuration::days(i64::from(days));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let entries = sqlx::query_as::<_, SymptomLog>(&format!(
            "SELECT {} FROM symptom_logs \
             WHERE user_id = ? AND started_at >= ? \
             ORDER BY started_at DESC, created_at DESC \
             LIMIT ?",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .bind(window_start)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load summary window: {}", e))
        })?;

        observe_db_query("summarize_window", started);
        Ok(entries)
    }
}
