use crate::models::{Severity, SymptomLog};
use crate::services::Summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LogRequest {
    #[validate(length(min = 1, max = 128, message = "user_id must be 1-128 characters"))]
    pub user_id: String,

    #[validate(length(min = 1, max = 2000, message = "message must be 1-2000 characters"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EntriesParams {
    #[validate(length(min = 1, max = 128, message = "user_id must be 1-128 characters"))]
    pub user_id: String,

    /// ISO 8601 timestamp or a relative phrase such as "3 days ago".
    pub since: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SummaryParams {
    #[validate(length(min = 1, max = 128, message = "user_id must be 1-128 characters"))]
    pub user_id: String,

    #[validate(range(min = 1, max = 90, message = "days must be between 1 and 90"))]
    #[serde(default = "default_days")]
    pub days: u32,

    #[validate(length(max = 500, message = "question must be at most 500 characters"))]
    pub question: Option<String>,
}

fn default_days() -> u32 {
    7
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: String,
    pub user_id: String,
    pub symptom: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_score: Option<i64>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SymptomLog> for EntryResponse {
    fn from(log: SymptomLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            symptom: log.symptom,
            severity: log.severity,
            severity_score: log.severity_score,
            started_at: log.started_at,
            ended_at: log.ended_at,
            duration_secs: log.duration_secs,
            treatment: log.treatment,
            location: log.location,
            notes: log.notes,
            created_at: log.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub degraded: bool,
    pub entry_count: usize,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        Self {
            summary: summary.text,
            degraded: summary.degraded,
            entry_count: summary.entry_count,
        }
    }
}
