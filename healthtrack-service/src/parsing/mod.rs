pub mod duration;
pub mod message;
pub mod time;

pub use duration::parse_duration;
pub use message::{parse_message, MessageParseError};
pub use time::{natural_language_to_datetime, parse_iso_timestamp, TimeParseError};

use crate::models::NewSymptomLog;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use service_core::error::AppError;

/// Parse a message and run entry validation, mapping failures onto API errors.
pub fn build_entry(
    user_id: &str,
    message: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<NewSymptomLog, AppError> {
    let entry = parse_message(user_id, message, now, tz)
        .map_err(|e| AppError::invalid_field(e.field, e.message))?;
    entry.validate_entry()?;
    Ok(entry)
}

/// Resolve a `since` filter: ISO 8601 first (naive values are UTC), then
/// relative phrases in the user's timezone.
pub fn resolve_since(text: &str, now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    if let Some(ts) = parse_iso_timestamp(text) {
        return Ok(ts);
    }
    natural_language_to_datetime(text, now, tz).map_err(|e| {
        AppError::invalid_field(
            "since",
            format!("expected an ISO 8601 timestamp or a relative time ({})", e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 18, 30, 0).unwrap()
    }

    #[test]
    fn test_resolve_since_accepts_iso_and_relative() {
        let iso = resolve_since("2024-07-01T08:00:00Z", now(), chrono_tz::UTC).unwrap();
        assert_eq!(iso, Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap());

        let relative = resolve_since("3 days ago", now(), chrono_tz::UTC).unwrap();
        assert_eq!(relative, now() - chrono::Duration::days(3));
    }

    #[test]
    fn test_resolve_since_rejects_garbage() {
        let err = resolve_since("not-a-date", now(), chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, AppError::InvalidField { ref field, .. } if field == "since"));
    }

    #[test]
    fn test_resolve_since_rejects_trailing_text() {
        for text in ["2024-07-01 08:00 banana", "2024-07-01T08:00:00 02:00"] {
            let err = resolve_since(text, now(), chrono_tz::UTC).unwrap_err();
            assert!(
                matches!(err, AppError::InvalidField { ref field, .. } if field == "since"),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_resolve_since_applies_offset() {
        let resolved = resolve_since("2024-07-01 08:00 -05:00", now(), chrono_tz::UTC).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 7, 1, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_build_entry_rejects_trailing_text_after_onset() {
        let err = build_entry("u1", "Headache since 2024-06-30 08:00 banana", now(), chrono_tz::UTC)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidField { ref field, .. } if field == "started_at"));
    }

    #[test]
    fn test_build_entry_validates_user_id() {
        let long_user = "x".repeat(200);
        let err = build_entry(&long_user, "Headache", now(), chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
