//! Resolution of explicit and relative time expressions.
//!
//! Relative phrases ("this morning", "8pm", "2 hours ago") are anchored in
//! the user's timezone and always come back as UTC.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TimeParseError {
    #[error("empty time expression")]
    Empty,

    #[error("unrecognised time expression: {0}")]
    Unrecognised(String),

    #[error("invalid time: {0}")]
    Invalid(String),
}

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})-(\d{2})-(\d{2})(?:[ T](\d{2}):(\d{2})(?::(\d{2})(?:\.\d{1,9})?)?)?").unwrap()
});

// Zone designator allowed after an explicit timestamp: Z, UTC, GMT, or a signed offset.
static ZONE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:z|utc|gmt)?\s*(?:([+-])(\d{2}):?(\d{2}))?$").unwrap()
});

static NOON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:noon|midday)\b").unwrap());

static MIDNIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmidnight\b").unwrap());

static AGO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,5}|an?|one)\s+(minutes?|mins?|hours?|hrs?|days?|weeks?)\s+ago\b").unwrap()
});

static CLOCK_12H_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b").unwrap());

static CLOCK_24H_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());

static NOW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(now|today)\b").unwrap());

/// Resolve `text` to a UTC instant, interpreting local phrases in `tz`.
pub fn natural_language_to_datetime(
    text: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Some(dt) = explicit_datetime(trimmed, tz)? {
        return Ok(dt);
    }

    let lower = trimmed.to_lowercase();

    if let Some(caps) = AGO_RE.captures(&lower) {
        let amount = match &caps[1] {
            "a" | "an" | "one" => 1,
            n => n
                .parse::<i64>()
                .map_err(|_| TimeParseError::Invalid(n.to_string()))?,
        };
        let unit = &caps[2];
        let delta = if unit.starts_with("min") {
            Duration::minutes(amount)
        } else if unit.starts_with('h') {
            Duration::hours(amount)
        } else if unit.starts_with('d') {
            Duration::days(amount)
        } else {
            Duration::weeks(amount)
        };
        return Ok(now - delta);
    }

    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();
    let yesterday = today - Duration::days(1);
    let clock = clock_time(&lower)?;

    let anchored = if lower.contains("last night") {
        Some((yesterday, clock.unwrap_or_else(|| hm(22, 0))))
    } else if lower.contains("yesterday") {
        Some((yesterday, clock.unwrap_or_else(|| hm(12, 0))))
    } else if lower.contains("this morning") {
        Some((today, clock.unwrap_or_else(|| hm(8, 0))))
    } else if lower.contains("this afternoon") {
        Some((today, clock.unwrap_or_else(|| hm(15, 0))))
    } else if lower.contains("this evening") || lower.contains("tonight") {
        Some((today, clock.unwrap_or_else(|| hm(20, 0))))
    } else if lower.contains("today") {
        clock.map(|time| (today, time))
    } else {
        None
    };

    if let Some((date, time)) = anchored {
        return to_utc(date.and_time(time), tz);
    }

    if let Some(time) = clock {
        let candidate = to_utc(today.and_time(time), tz)?;
        if candidate <= now {
            return Ok(candidate);
        }
        return to_utc(yesterday.and_time(time), tz);
    }

    if NOW_RE.is_match(&lower) {
        return Ok(now);
    }

    Err(TimeParseError::Unrecognised(trimmed.to_string()))
}

/// Strict ISO 8601 parsing: RFC 3339 with offset, or a naive timestamp taken as UTC.
pub fn parse_iso_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn explicit_datetime(text: &str, tz: Tz) -> Result<Option<DateTime<Utc>>, TimeParseError> {
    let Some(caps) = DATETIME_RE.captures(text) else {
        return Ok(None);
    };

    let field = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let year: i32 = caps[1]
        .parse()
        .map_err(|_| TimeParseError::Invalid(caps[0].to_string()))?;

    let naive = NaiveDate::from_ymd_opt(year, field(2), field(3))
        .and_then(|date| date.and_hms_opt(field(4), field(5), field(6)))
        .ok_or_else(|| TimeParseError::Invalid(caps[0].to_string()))?;

    let Some(whole) = caps.get(0) else {
        return Ok(None);
    };
    let prefix = text[..whole.start()].trim();
    let suffix = text[whole.end()..].trim();
    if !prefix.is_empty() {
        return Err(TimeParseError::Invalid(format!(
            "unexpected text before timestamp: '{}'",
            prefix
        )));
    }

    let zone = ZONE_SUFFIX_RE.captures(suffix).ok_or_else(|| {
        TimeParseError::Invalid(format!("unexpected text after timestamp: '{}'", suffix))
    })?;

    if let (Some(sign), Some(hours), Some(minutes)) = (zone.get(1), zone.get(2), zone.get(3)) {
        let hours: i32 = hours.as_str().parse().unwrap_or(0);
        let minutes: i32 = minutes.as_str().parse().unwrap_or(0);
        let seconds = (hours * 3600 + minutes * 60) * if sign.as_str() == "-" { -1 } else { 1 };
        let offset = FixedOffset::east_opt(seconds)
            .ok_or_else(|| TimeParseError::Invalid(format!("offset out of range: '{}'", suffix)))?;
        return offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .ok_or_else(|| TimeParseError::Invalid(whole.as_str().to_string()));
    }

    if !suffix.is_empty() {
        return Ok(Some(Utc.from_utc_datetime(&naive)));
    }

    to_utc(naive, tz).map(Some)
}

fn clock_time(lower: &str) -> Result<Option<NaiveTime>, TimeParseError> {
    if NOON_RE.is_match(lower) {
        return Ok(Some(hm(12, 0)));
    }
    if MIDNIGHT_RE.is_match(lower) {
        return Ok(Some(hm(0, 0)));
    }

    if let Some(caps) = CLOCK_12H_RE.captures(lower) {
        let hour: u32 = caps[1]
            .parse()
            .map_err(|_| TimeParseError::Invalid(caps[0].to_string()))?;
        let minute: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        if hour == 0 || hour > 12 {
            return Err(TimeParseError::Invalid(caps[0].to_string()));
        }
        let hour = match (&caps[3], hour) {
            ("a", 12) => 0,
            ("a", h) => h,
            (_, 12) => 12,
            (_, h) => h + 12,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Some)
            .ok_or_else(|| TimeParseError::Invalid(caps[0].to_string()));
    }

    if let Some(caps) = CLOCK_24H_RE.captures(lower) {
        let hour: u32 = caps[1].parse().unwrap_or(0);
        let minute: u32 = caps[2].parse().unwrap_or(0);
        return Ok(NaiveTime::from_hms_opt(hour, minute, 0));
    }

    Ok(None)
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn to_utc(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, TimeParseError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimeParseError::Invalid(format!("{} does not exist in {}", naive, tz)))
}
