use chrono_tz::Tz;
use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_optional_env};
use service_core::error::AppError;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DB_PATH: &str = "health.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LLM_TEMPERATURE: f32 = 0.3;
const DEFAULT_SUMMARY_MAX_ENTRIES: usize = 20;
const DEFAULT_SUMMARY_TOP_K: usize = 8;
pub const DEFAULT_SUMMARY_QUESTION: &str = "Summarize my recent symptoms.";

#[derive(Debug, Clone)]
pub struct HealthTrackConfig {
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub llm: LlmConfig,
    pub summary: SummaryConfig,
    /// Zone used to anchor relative times such as "this morning".
    pub user_timezone: Tz,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub api_token: Option<Secret<String>>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
    Mock,
}

impl LlmProvider {
    fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Gemini => "gemini-2.0-flash",
            Self::Mock => "mock",
        }
    }

    fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Gemini => Some("GOOGLE_API_KEY"),
            Self::Mock => None,
        }
    }
}

impl FromStr for LlmProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            "mock" => Ok(Self::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown LLM_PROVIDER '{}': expected openai, gemini or mock",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Newest entries in the window considered for a summary.
    pub max_entries: usize,
    /// Entries, ranked by relevance to the question, that reach the prompt.
    pub top_k: usize,
    pub default_question: String,
}

impl HealthTrackConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        let provider: LlmProvider = get_env("LLM_PROVIDER", Some("openai"), is_prod)?.parse()?;
        let api_key = provider
            .api_key_env()
            .and_then(get_optional_env)
            .map(Secret::new);

        let timezone = get_env("USER_TIMEZONE", Some("UTC"), is_prod)?;
        let user_timezone = timezone.trim().parse::<Tz>().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid USER_TIMEZONE '{}': {}", timezone, e))
        })?;

        Ok(HealthTrackConfig {
            common: common_config,
            database: DatabaseConfig {
                path: PathBuf::from(get_env("HEALTH_DB_PATH", Some(DEFAULT_DB_PATH), is_prod)?),
                max_connections: get_env(
                    "DATABASE_MAX_CONNECTIONS",
                    Some(&DEFAULT_MAX_CONNECTIONS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            },
            security: SecurityConfig {
                api_token: get_optional_env("API_TOKEN").map(Secret::new),
                cors_origins: parse_cors_origins(get_optional_env("CORS_ORIGINS").as_deref()),
            },
            llm: LlmConfig {
                provider,
                api_key,
                model: get_optional_env("LLM_MODEL")
                    .unwrap_or_else(|| provider.default_model().to_string()),
                base_url: get_optional_env("LLM_BASE_URL"),
                timeout_secs: get_env(
                    "LLM_TIMEOUT_SECS",
                    Some(&DEFAULT_LLM_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
                temperature: get_env(
                    "LLM_TEMPERATURE",
                    Some(&DEFAULT_LLM_TEMPERATURE.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_LLM_TEMPERATURE),
            },
            summary: SummaryConfig {
                max_entries: get_env(
                    "SUMMARY_MAX_ENTRIES",
                    Some(&DEFAULT_SUMMARY_MAX_ENTRIES.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_SUMMARY_MAX_ENTRIES),
                top_k: get_env(
                    "SUMMARY_TOP_K",
                    Some(&DEFAULT_SUMMARY_TOP_K.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_SUMMARY_TOP_K),
                default_question: DEFAULT_SUMMARY_QUESTION.to_string(),
            },
            user_timezone,
        })
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_SUMMARY_MAX_ENTRIES,
            top_k: DEFAULT_SUMMARY_TOP_K,
            default_question: DEFAULT_SUMMARY_QUESTION.to_string(),
        }
    }
}

impl LlmConfig {
    /// Offline configuration backed by the mock provider.
    pub fn mock() -> Self {
        Self {
            provider: LlmProvider::Mock,
            api_key: None,
            model: LlmProvider::Mock.default_model().to_string(),
            base_url: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            temperature: DEFAULT_LLM_TEMPERATURE,
        }
    }
}

/// Split a comma-separated origin list. `*` anywhere, or no value, allows any origin.
pub fn parse_cors_origins(raw: Option<&str>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if origins.iter().any(|o| o == "*") {
        return Vec::new();
    }
    origins
}
