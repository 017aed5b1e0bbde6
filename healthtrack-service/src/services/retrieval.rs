//! Selection of the entries that reach the summary prompt.
//!
//! The summary window can hold more entries than are worth sending to the
//! provider, so a retriever ranks them against the user's question and keeps
//! the top `k`.

use crate::models::SymptomLog;
use std::collections::HashSet;

/// Picks the entries most relevant to a question.
pub trait EntryRetriever: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `k` entries from `entries` (newest first), most relevant first.
    fn retrieve<'a>(&self, question: &str, entries: &'a [SymptomLog], k: usize)
        -> Vec<&'a SymptomLog>;
}

const STOPWORDS: &[&str] = &[
    "about", "after", "all", "and", "any", "are", "been", "before", "can", "did", "does", "doing",
    "for", "from", "get", "getting", "had", "has", "have", "how", "into", "last", "many", "more",
    "most", "much", "recent", "recently", "should", "since", "summarise", "summarize", "summary",
    "symptom", "symptoms", "tell", "than", "that", "the", "their", "there", "these", "this",
    "was", "were", "what", "when", "where", "which", "while", "who", "why", "will", "with",
    "worse", "better", "you", "your",
];

const SYMPTOM_WEIGHT: u32 = 3;
const DETAIL_WEIGHT: u32 = 2;
const NOTES_WEIGHT: u32 = 1;

/// Keyword overlap between the question and each entry's fields.
///
/// Symptom matches count most, then location and treatment, then severity
/// and notes. Ties, including a question with no usable terms, keep the
/// newest entries first.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRetriever;

impl EntryRetriever for KeywordRetriever {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn retrieve<'a>(
        &self,
        question: &str,
        entries: &'a [SymptomLog],
        k: usize,
    ) -> Vec<&'a SymptomLog> {
        let query = terms(question);

        let mut ranked: Vec<(u32, &SymptomLog)> = entries
            .iter()
            .map(|entry| (score(&query, entry), entry))
            .collect();
        // Stable: equal scores stay in recency order.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        ranked.into_iter().take(k).map(|(_, entry)| entry).collect()
    }
}

fn score(query: &HashSet<String>, entry: &SymptomLog) -> u32 {
    if query.is_empty() {
        return 0;
    }

    let symptom = terms(&entry.symptom);
    let details = terms(&format!(
        "{} {}",
        entry.location.as_deref().unwrap_or_default(),
        entry.treatment.as_deref().unwrap_or_default()
    ));
    let notes = terms(&format!(
        "{} {}",
        entry.severity,
        entry.notes.as_deref().unwrap_or_default()
    ));

    query
        .iter()
        .map(|term| {
            if symptom.contains(term) {
                SYMPTOM_WEIGHT
            } else if details.contains(term) {
                DETAIL_WEIGHT
            } else if notes.contains(term) {
                NOTES_WEIGHT
            } else {
                0
            }
        })
        .sum()
}

/// Lowercased word stems of three or more letters, minus stopwords.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .map(|w| stem(&w))
        .collect()
}

fn stem(word: &str) -> String {
    if word.len() > 4 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use chrono::{Duration, TimeZone, Utc};

    fn entry(symptom: &str, location: Option<&str>, hours_ago: i64) -> SymptomLog {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 18, 0, 0).unwrap();
        let started_at = now - Duration::hours(hours_ago);
        SymptomLog {
            id: format!("{}-{}", symptom, hours_ago),
            user_id: "u1".to_string(),
            symptom: symptom.to_string(),
            severity: Severity::Mild,
            severity_score: None,
            started_at,
            ended_at: None,
            duration_secs: None,
            treatment: None,
            location: location.map(str::to_string),
            notes: None,
            created_at: started_at,
        }
    }

    fn symptoms(selected: &[&SymptomLog]) -> Vec<String> {
        selected.iter().map(|e| e.symptom.clone()).collect()
    }

    #[test]
    fn test_matching_entries_rank_first() {
        let entries = vec![
            entry("Cough", None, 1),
            entry("Pain", Some("left knee"), 2),
            entry("Headaches", None, 3),
        ];

        let selected = KeywordRetriever.retrieve("How is my knee doing?", &entries, 8);
        assert_eq!(symptoms(&selected), vec!["Pain", "Cough", "Headaches"]);

        let selected = KeywordRetriever.retrieve("Any headache patterns?", &entries, 1);
        assert_eq!(symptoms(&selected), vec!["Headaches"]);
    }

    #[test]
    fn test_symptom_match_outranks_location_match() {
        let mut rash = entry("Rash", None, 1);
        rash.notes = Some("itchy rash on my arm".to_string());
        let entries = vec![rash, entry("Arm ache", Some("shoulder"), 5)];

        let selected = KeywordRetriever.retrieve("arm", &entries, 2);
        assert_eq!(symptoms(&selected), vec!["Arm ache", "Rash"]);
    }

    #[test]
    fn test_generic_question_keeps_newest() {
        let entries: Vec<SymptomLog> = (1..=5).map(|h| entry("Cough", None, h)).collect();

        let selected = KeywordRetriever.retrieve("Summarize my recent symptoms.", &entries, 3);
        let ids: Vec<&str> = selected.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["Cough-1", "Cough-2", "Cough-3"]);
    }

    #[test]
    fn test_terms_drop_stopwords_and_plurals() {
        let found = terms("What about my Headaches and the knee?");
        assert!(found.contains("headache"));
        assert!(found.contains("knee"));
        assert!(!found.contains("about"));
        assert!(!found.contains("my"));
    }
}
