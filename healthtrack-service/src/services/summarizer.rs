//! Summaries of a user's recent entries.
//!
//! The provider call is bounded by a timeout. Any provider failure degrades to
//! a deterministic bullet list instead of surfacing an error.

use crate::models::SymptomLog;
use crate::services::metrics::{record_llm_tokens, record_summary};
use crate::services::providers::{GenerationParams, ProviderError, TextProvider};
use crate::services::retrieval::{EntryRetriever, KeywordRetriever};
use chrono::SecondsFormat;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are a careful assistant summarising a patient's self-reported \
     symptom log for a doctor. Be concise, factual and do not diagnose.";

const FALLBACK_HEADER: &str = "Summary service unavailable. Recent entries:";

const DEFAULT_TOP_K: usize = 8;
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub text: String,
    /// True when the text is the fallback bullet list.
    pub degraded: bool,
    pub entry_count: usize,
}

#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn TextProvider>,
    retriever: Arc<dyn EntryRetriever>,
    top_k: usize,
    timeout: Duration,
    temperature: f32,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration, temperature: f32) -> Self {
        Self {
            provider,
            retriever: Arc::new(KeywordRetriever),
            top_k: DEFAULT_TOP_K,
            timeout,
            temperature,
        }
    }

    /// Replace the entry retriever and the number of entries it may select.
    pub fn with_retrieval(mut self, retriever: Arc<dyn EntryRetriever>, top_k: usize) -> Self {
        self.retriever = retriever;
        self.top_k = top_k.max(1);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Provider reachability, bounded like a summary call.
    pub async fn provider_health(&self) -> Result<(), ProviderError> {
        let limit = self.timeout.min(HEALTH_CHECK_TIMEOUT);
        tokio::time::timeout(limit, self.provider.health_check())
            .await
            .map_err(|_| ProviderError::Timeout(limit.as_secs()))?
    }

    /// Summarise `entries` (newest first) covering the last `days` days.
    ///
    /// Only the `top_k` entries most relevant to `question` reach the prompt.
    #[instrument(skip(self, entries, question), fields(provider = self.provider.name(), entry_count = entries.len()))]
    pub async fn summarize(&self, entries: &[SymptomLog], question: &str, days: u32) -> Summary {
        if entries.is_empty() {
            record_summary("empty");
            return Summary {
                text: format!("No entries found for this user in the last {} days.", days),
                degraded: false,
                entry_count: 0,
            };
        }

        let selected: Vec<SymptomLog> = self
            .retriever
            .retrieve(question, entries, self.top_k)
            .into_iter()
            .cloned()
            .collect();
        info!(
            retriever = self.retriever.name(),
            selected = selected.len(),
            "Entries selected for summary"
        );

        let prompt = build_prompt(&selected, question);
        let params = GenerationParams {
            temperature: Some(self.temperature),
            max_tokens: Some(512),
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
        };

        match self.generate(&prompt, &params).await {
            Ok(text) => {
                record_summary("llm");
                info!("Summary generated");
                Summary {
                    text,
                    degraded: false,
                    entry_count: selected.len(),
                }
            }
            Err(e) => {
                record_summary("fallback");
                warn!(error = %e, "Summary provider failed, returning entry list");
                Summary {
                    text: format_fallback(&selected),
                    degraded: true,
                    entry_count: selected.len(),
                }
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let response = tokio::time::timeout(self.timeout, self.provider.generate(prompt, params))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;

        record_llm_tokens(
            self.provider.name(),
            response.input_tokens,
            response.output_tokens,
        );

        let text = response.text.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Prompt listing each entry on its own line, preceded by the user's question.
pub fn build_prompt(entries: &[SymptomLog], question: &str) -> String {
    let mut prompt = String::from(
        "Given the following symptom logs, provide a concise bullet point summary suitable for a doctor.\n",
    );
    let _ = writeln!(prompt, "Question: {}", question.trim());
    prompt.push_str("\nSymptom logs (most relevant first):\n");

    for entry in entries {
        let _ = write!(
            prompt,
            "- {} | symptom: {} | severity: {}",
            entry.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            entry.symptom,
            entry.severity
        );
        if let Some(score) = entry.severity_score {
            let _ = write!(prompt, " ({}/10)", score);
        }
        if let Some(location) = &entry.location {
            let _ = write!(prompt, " | location: {}", location);
        }
        if let Some(secs) = entry.duration_secs {
            let _ = write!(prompt, " | duration: {}", format_duration(secs));
        }
        if let Some(treatment) = &entry.treatment {
            let _ = write!(prompt, " | treatment: {}", treatment);
        }
        prompt.push('\n');
    }

    prompt
}

/// Deterministic bullet list used when the provider cannot answer.
pub fn format_fallback(entries: &[SymptomLog]) -> String {
    let mut text = String::from(FALLBACK_HEADER);
    for entry in entries {
        text.push('\n');
        text.push_str(&format_bullet(entry));
    }
    text
}

fn format_bullet(entry: &SymptomLog) -> String {
    let location = entry
        .location
        .as_deref()
        .map(|l| format!(" @ {}", l))
        .unwrap_or_default();
    format!(
        "- {}{} (severity: {}) {}",
        entry.symptom,
        location,
        entry.severity,
        entry.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

fn format_duration(secs: i64) -> String {
    let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
    match (hours, minutes) {
        (0, m) => format!("{}m", m.max(1)),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::services::providers::MockTextProvider;
    use chrono::{TimeZone, Utc};

    fn entry(symptom: &str, location: Option<&str>) -> SymptomLog {
        let started_at = Utc.with_ymd_and_hms(2024, 7, 1, 20, 0, 0).unwrap();
        SymptomLog {
            id: "id-1".to_string(),
            user_id: "u1".to_string(),
            symptom: symptom.to_string(),
            severity: Severity::Moderate,
            severity_score: Some(6),
            started_at,
            ended_at: None,
            duration_secs: Some(7200),
            treatment: Some("Advil".to_string()),
            location: location.map(str::to_string),
            notes: None,
            created_at: started_at,
        }
    }

    fn summarizer(provider: MockTextProvider) -> Summarizer {
        Summarizer::new(Arc::new(provider), Duration::from_millis(200), 0.3)
    }

    #[test]
    fn test_fallback_bullets() {
        let text = format_fallback(&[entry("Headache", None), entry("Pain", Some("left knee"))]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], FALLBACK_HEADER);
        assert_eq!(
            lines[1],
            "- Headache (severity: moderate) 2024-07-01T20:00:00Z"
        );
        assert_eq!(
            lines[2],
            "- Pain @ left knee (severity: moderate) 2024-07-01T20:00:00Z"
        );
    }

    #[test]
    fn test_prompt_contains_question_and_entries() {
        let prompt = build_prompt(&[entry("Headache", None)], "Any patterns?");
        assert!(prompt.contains("Question: Any patterns?"));
        assert!(prompt.contains("symptom: Headache | severity: moderate (6/10)"));
        assert!(prompt.contains("duration: 2h"));
        assert!(prompt.contains("treatment: Advil"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(7200), "2h");
        assert_eq!(format_duration(5400), "1h30m");
        assert_eq!(format_duration(1200), "20m");
        assert_eq!(format_duration(10), "1m");
    }

    #[tokio::test]
    async fn test_no_entries_is_not_degraded() {
        let summary = summarizer(MockTextProvider::new(true))
            .summarize(&[], "Summarize", 7)
            .await;
        assert_eq!(
            summary.text,
            "No entries found for this user in the last 7 days."
        );
        assert!(!summary.degraded);
        assert_eq!(summary.entry_count, 0);
    }

    #[tokio::test]
    async fn test_provider_answer_is_used() {
        let summary = summarizer(MockTextProvider::new(true))
            .summarize(&[entry("Headache", None)], "Summarize", 7)
            .await;
        assert!(!summary.degraded);
        assert!(summary.text.starts_with("Mock response for:"));
        assert!(summary.text.contains("Headache"));
        assert_eq!(summary.entry_count, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades() {
        let summary = summarizer(MockTextProvider::new(false))
            .summarize(&[entry("Headache", None)], "Summarize", 7)
            .await;
        assert!(summary.degraded);
        assert!(summary.text.contains("- Headache (severity: moderate)"));
    }

    #[tokio::test]
    async fn test_only_top_k_relevant_entries_reach_prompt() {
        let entries = vec![
            entry("Cough", None),
            entry("Sneezing", None),
            entry("Pain", Some("left knee")),
        ];
        let summary = summarizer(MockTextProvider::new(true))
            .with_retrieval(Arc::new(KeywordRetriever), 1)
            .summarize(&entries, "What about my knee?", 7)
            .await;

        assert_eq!(summary.entry_count, 1);
        assert!(summary.text.contains("location: left knee"));
        assert!(!summary.text.contains("Cough"));
    }

    #[tokio::test]
    async fn test_provider_health_follows_provider() {
        assert!(summarizer(MockTextProvider::new(true))
            .provider_health()
            .await
            .is_ok());
        assert!(summarizer(MockTextProvider::new(false))
            .provider_health()
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_provider_timeout_degrades() {
        let slow = MockTextProvider::new(true).with_delay(Duration::from_secs(5));
        let summary = summarizer(slow)
            .summarize(&[entry("Headache", None)], "Summarize", 7)
            .await;
        assert!(summary.degraded);
    }
}
