use super::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// A persisted symptom observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SymptomLog {
    pub id: String,
    pub user_id: String,
    pub symptom: String,
    pub severity: Severity,
    pub severity_score: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub treatment: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An entry that has been parsed but not yet stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewSymptomLog {
    #[validate(length(min = 1, max = 128, message = "user_id must be 1-128 characters"))]
    pub user_id: String,

    #[validate(length(min = 1, max = 500, message = "symptom must be 1-500 characters"))]
    pub symptom: String,

    pub severity: Severity,

    #[validate(range(min = 0, max = 10, message = "severity score must be between 0 and 10"))]
    pub severity_score: Option<i64>,

    pub started_at: DateTime<Utc>,

    pub ended_at: Option<DateTime<Utc>>,

    #[validate(range(min = 0, message = "duration cannot be negative"))]
    pub duration_secs: Option<i64>,

    #[validate(length(max = 200, message = "treatment must be at most 200 characters"))]
    pub treatment: Option<String>,

    #[validate(length(max = 100, message = "location must be at most 100 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 2000, message = "notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl NewSymptomLog {
    pub fn new(
        user_id: impl Into<String>,
        symptom: impl Into<String>,
        severity: Severity,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            symptom: symptom.into(),
            severity,
            severity_score: None,
            started_at,
            ended_at: None,
            duration_secs: None,
            treatment: None,
            location: None,
            notes: None,
        }
    }

    /// Attach a duration and derive `ended_at` from it.
    pub fn with_duration(mut self, duration: chrono::Duration) -> Self {
        self.duration_secs = Some(duration.num_seconds());
        self.ended_at = Some(self.started_at + duration);
        self
    }

    /// Field rules from the derive plus the cross-field checks it cannot express.
    pub fn validate_entry(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if !self.user_id.is_empty() && self.user_id.trim().is_empty() {
            errors.add("user_id", field_error("blank", "user_id cannot be blank"));
        }

        if !self.symptom.is_empty() && self.symptom.trim().is_empty() {
            errors.add("symptom", field_error("blank", "symptom cannot be blank"));
        }

        if let Some(ended_at) = self.ended_at {
            if ended_at < self.started_at {
                errors.add(
                    "ended_at",
                    field_error("order", "ended_at must not be before started_at"),
                );
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message));
    error
}
