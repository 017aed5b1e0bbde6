//! Mock provider for tests and offline runs.

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::time::Duration;

pub struct MockTextProvider {
    enabled: bool,
    delay: Duration,
}

impl MockTextProvider {
    /// A disabled mock fails every call with `NotConfigured`.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            delay: Duration::ZERO,
        }
    }

    /// Sleep before answering, to exercise caller timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(ProviderResponse {
            text: format!("Mock response for: {}", prompt),
            input_tokens: Some((prompt.len() / 4) as u32),
            output_tokens: Some(10),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}
