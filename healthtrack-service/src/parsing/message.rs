//! Free-text symptom message parsing.
//!
//! Messages are split on commas and semicolons. The leading clause names the
//! symptom; the rest of the message is scanned for a severity score or word,
//! an onset phrase, a duration, a treatment and a body location.

use super::duration::find_duration;
use super::time::{natural_language_to_datetime, TimeParseError};
use crate::models::{NewSymptomLog, Severity};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct MessageParseError {
    pub field: &'static str,
    pub message: String,
}

impl MessageParseError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,3})\s*/\s*10\b").unwrap());

// "light" is left out: in free text it is usually part of the symptom ("light sensitivity").
static SEVERITY_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(mild|moderate|severe|slight|average|noticeable|strong|intense|awful|terrible)\b",
    )
    .unwrap()
});

// Strict keywords must resolve; "at" and "from" are also ordinary prepositions.
static ONSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(since|started(?:\s+at)?|starting(?:\s+at)?|began(?:\s+at)?|from|at)\s+(.+?)(?:\s+(?:for|took|taking|and|with)\b|[,;\n]|$)",
    )
    .unwrap()
});

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(yesterday|last night|this morning|this afternoon|this evening|tonight|\d{1,5}\s+(?:minutes?|mins?|hours?|hrs?|days?|weeks?)\s+ago|an?\s+(?:minute|hour|day|week)\s+ago)\b",
    )
    .unwrap()
});

static TREATMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:took|taken|taking|take|used|using|applied)\s+([^,;\n]+)").unwrap()
});

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|on)\s+(?:my|the)\s+([a-z]+(?:\s+[a-z]+){0,2})").unwrap()
});

static SYMPTOM_CUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:since|started|starting|began|from|at|for|took|taken|taking|used|using|applied|in my|on my|in the|on the|yesterday|last night|this morning|this afternoon|this evening|tonight|today|now|\d{1,5}\s+(?:minutes?|mins?|hours?|hrs?|days?|weeks?)\s+ago)\b",
    )
    .unwrap()
});

static FILLER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:i\s+(?:have|had|feel|felt|got|am having|was having|'ve got|have got)\s+)?(?:(?:a|an|some)\s+)?",
    )
    .unwrap()
});

const LOCATION_STOPWORDS: &[&str] = &[
    "since", "for", "at", "from", "and", "after", "before", "took", "taking", "started", "today",
    "yesterday", "tonight", "this", "last", "with", "when", "while",
];

const STRICT_ONSET: &[&str] = &["since", "started", "starting", "began"];

/// Parse a free-text message into an entry. The result is not yet validated.
pub fn parse_message(
    user_id: &str,
    message: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<NewSymptomLog, MessageParseError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(MessageParseError::new("message", "message cannot be empty"));
    }

    let (severity, severity_score) = parse_severity(message)?;
    let (started_at, onset_span) = parse_onset(message, now, tz)?;

    let symptom = extract_symptom(message)
        .ok_or_else(|| MessageParseError::new("symptom", "could not find a symptom"))?;

    let mut entry = NewSymptomLog::new(user_id, symptom, severity, started_at);
    entry.severity_score = severity_score;
    entry.treatment = extract_treatment(message);
    entry.location = extract_location(message);
    entry.notes = Some(message.to_string());

    if let Some(found) = find_duration(message) {
        let inside_onset = onset_span
            .as_ref()
            .is_some_and(|span| span.start <= found.span.start && found.span.end <= span.end);
        if !inside_onset {
            entry = entry.with_duration(found.duration);
        }
    }

    Ok(entry)
}

fn parse_severity(message: &str) -> Result<(Severity, Option<i64>), MessageParseError> {
    if let Some(caps) = SCORE_RE.captures(message) {
        let score: u8 = caps[1]
            .parse()
            .map_err(|_| MessageParseError::new("severity", "score must be between 0 and 10"))?;
        let severity = Severity::from_score(score)
            .ok_or_else(|| MessageParseError::new("severity", "score must be between 0 and 10"))?;
        return Ok((severity, Some(i64::from(score))));
    }

    if let Some(word) = SEVERITY_WORD_RE.find(message) {
        let severity = word
            .as_str()
            .parse::<Severity>()
            .map_err(|e| MessageParseError::new("severity", e))?;
        return Ok((severity, None));
    }

    Ok((Severity::None, None))
}

fn parse_onset(
    message: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<(DateTime<Utc>, Option<Range<usize>>), MessageParseError> {
    for caps in ONSET_RE.captures_iter(message) {
        let (Some(keyword), Some(phrase)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let keyword = keyword.as_str().to_lowercase();
        let strict = STRICT_ONSET.iter().any(|k| keyword.starts_with(k));

        match natural_language_to_datetime(phrase.as_str(), now, tz) {
            Ok(started_at) => return Ok((started_at, Some(phrase.range()))),
            Err(e) if strict => return Err(onset_error(e)),
            Err(_) => continue,
        }
    }

    if let Some(relative) = RELATIVE_RE.find(message) {
        let clause = clause_around(message, relative.range());
        let started_at =
            natural_language_to_datetime(&message[clause.clone()], now, tz).map_err(onset_error)?;
        return Ok((started_at, Some(clause)));
    }

    Ok((now, None))
}

fn onset_error(err: TimeParseError) -> MessageParseError {
    MessageParseError::new("started_at", err.to_string())
}

fn clause_around(message: &str, span: Range<usize>) -> Range<usize> {
    let start = message[..span.start]
        .rfind([',', ';', '\n'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = message[span.end..]
        .find([',', ';', '\n'])
        .map(|i| span.end + i)
        .unwrap_or(message.len());
    start..end
}

fn extract_symptom(message: &str) -> Option<String> {
    let first_clause = message
        .split([',', ';', '\n'])
        .map(str::trim)
        .find(|c| !c.is_empty())?;

    let head = SYMPTOM_CUT_RE
        .find(first_clause)
        .map(|m| &first_clause[..m.start()])
        .unwrap_or(first_clause);

    let cleaned = clean_symptom(head);
    if !cleaned.is_empty() {
        return Some(cleaned);
    }

    // The clause opened with a cut word ("since 8pm headache"); fall back to it whole.
    let cleaned = clean_symptom(first_clause);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn clean_symptom(text: &str) -> String {
    let without_score = SCORE_RE.replace_all(text, " ");
    let without_severity = SEVERITY_WORD_RE.replace_all(&without_score, " ");
    let collapsed = without_severity
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let stripped = FILLER_RE.replace(&collapsed, "");
    stripped
        .trim_matches(|c: char| c.is_whitespace() || "-:.!?()".contains(c))
        .to_string()
}

fn extract_treatment(message: &str) -> Option<String> {
    let caps = TREATMENT_RE.captures(message)?;
    let raw = caps.get(1)?.as_str();
    let raw = raw
        .split(" for ")
        .next()
        .unwrap_or(raw)
        .trim()
        .trim_end_matches(['.', '!']);
    let lower = raw.to_lowercase();
    let treatment = ["a ", "an ", "some "]
        .iter()
        .find_map(|article| lower.starts_with(article).then(|| &raw[article.len()..]))
        .unwrap_or(raw)
        .trim();
    (!treatment.is_empty()).then(|| treatment.to_string())
}

fn extract_location(message: &str) -> Option<String> {
    let caps = LOCATION_RE.captures(message)?;
    let words: Vec<&str> = caps
        .get(1)?
        .as_str()
        .split_whitespace()
        .take_while(|w| !LOCATION_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    (!words.is_empty()).then(|| words.join(" ").to_lowercase())
}
