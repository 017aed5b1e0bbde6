use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(\d{1,4}(?:\.\d+)?)\s*|(half an?|an?|one)\s+)(seconds?|secs?|minutes?|mins?|m|hours?|hrs?|hr|h|days?|d|weeks?|wks?|w)\b",
    )
    .unwrap()
});

/// A duration found inside a longer piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationMatch {
    pub duration: Duration,
    pub span: Range<usize>,
}

/// Parse the first duration expression in `text` ("2h", "45 min", "for 3 days").
pub fn parse_duration(text: &str) -> Option<Duration> {
    find_duration(text).map(|m| m.duration)
}

/// Locate the first duration that is not an onset offset ("2 hours ago").
pub fn find_duration(text: &str) -> Option<DurationMatch> {
    DURATION_RE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if text[whole.end()..]
            .trim_start()
            .to_lowercase()
            .starts_with("ago")
        {
            return None;
        }

        let amount = match (caps.get(1), caps.get(2)) {
            (Some(number), _) => number.as_str().parse::<f64>().ok()?,
            (None, Some(word)) if word.as_str().to_lowercase().starts_with("half") => 0.5,
            (None, Some(_)) => 1.0,
            (None, None) => return None,
        };

        let seconds = amount * unit_seconds(&caps[3].to_lowercase())?;
        Some(DurationMatch {
            duration: Duration::seconds(seconds.round() as i64),
            span: whole.range(),
        })
    })
}

fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
        "d" | "day" | "days" => 86_400.0,
        "w" | "wk" | "wks" | "week" | "weeks" => 604_800.0,
        _ => return None,
    };
    Some(seconds)
}
