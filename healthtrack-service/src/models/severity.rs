//! Standardised symptom severity levels.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Get string representation for database and API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    /// Map a 0-10 pain score onto a level. Scores above 10 are rejected.
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            0 => Some(Self::None),
            1..=3 => Some(Self::Mild),
            4..=6 => Some(Self::Moderate),
            7..=10 => Some(Self::Severe),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "none" => Ok(Self::None),
            "mild" | "slight" | "light" => Ok(Self::Mild),
            "moderate" | "average" | "noticeable" => Ok(Self::Moderate),
            "severe" | "strong" | "intense" | "awful" | "terrible" => Ok(Self::Severe),
            _ => {
                if let Ok(score) = value.parse::<u8>() {
                    if let Some(level) = Self::from_score(score) {
                        return Ok(level);
                    }
                }
                Err(format!("Unknown severity: {}", s.trim()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_synonyms() {
        assert_eq!("slight".parse::<Severity>().unwrap(), Severity::Mild);
        assert_eq!("INTENSE".parse::<Severity>().unwrap(), Severity::Severe);
        assert_eq!("average".parse::<Severity>().unwrap(), Severity::Moderate);
        assert_eq!("awful".parse::<Severity>().unwrap(), Severity::Severe);
        assert_eq!(" Mild ".parse::<Severity>().unwrap(), Severity::Mild);
        assert!("unknown".parse::<Severity>().is_err());
    }

    #[test]
    fn test_score_mapping() {
        assert_eq!(Severity::from_score(0), Some(Severity::None));
        assert_eq!(Severity::from_score(3), Some(Severity::Mild));
        assert_eq!(Severity::from_score(6), Some(Severity::Moderate));
        assert_eq!(Severity::from_score(10), Some(Severity::Severe));
        assert_eq!(Severity::from_score(11), None);
        assert_eq!("8".parse::<Severity>().unwrap(), Severity::Severe);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
    }
}
