//! Text-generation provider abstractions and implementations.
//!
//! Summaries are produced through the `TextProvider` trait so the hosted
//! backend (OpenAI-compatible or Gemini) can be swapped for a mock.

pub mod gemini;
pub mod mock;
pub mod openai;

use crate::config::{LlmConfig, LlmProvider};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;
use thiserror::Error;

pub use gemini::{GeminiConfig, GeminiTextProvider};
pub use mock::MockTextProvider;
pub use openai::{OpenAiConfig, OpenAiTextProvider};

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider returned no text")]
    EmptyResponse,
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,

    /// Input tokens consumed, when the backend reports them.
    pub input_tokens: Option<u32>,

    /// Output tokens generated, when the backend reports them.
    pub output_tokens: Option<u32>,
}

/// Generation parameters for provider requests.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<u32>,

    /// Instructions sent ahead of the user prompt.
    pub system_prompt: Option<String>,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Backend name used in logs.
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Build the provider selected by `LLM_PROVIDER`.
///
/// A hosted provider without an API key is still constructed; its calls fail
/// with `NotConfigured` and summaries fall back to the bullet list.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn TextProvider>, ProviderError> {
    let api_key = config
        .api_key
        .as_ref()
        .map(|k| k.expose_secret().clone())
        .unwrap_or_default();
    let timeout = std::time::Duration::from_secs(config.timeout_secs);

    let provider: Arc<dyn TextProvider> = match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiTextProvider::new(
            OpenAiConfig {
                api_key,
                model: config.model.clone(),
                base_url: config.base_url.clone(),
            },
            timeout,
        )?),
        LlmProvider::Gemini => Arc::new(GeminiTextProvider::new(
            GeminiConfig {
                api_key,
                model: config.model.clone(),
                base_url: config.base_url.clone(),
            },
            timeout,
        )?),
        LlmProvider::Mock => Arc::new(MockTextProvider::new(true)),
    };

    Ok(provider)
}

fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}
