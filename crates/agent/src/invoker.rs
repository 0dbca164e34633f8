//! Completion invoker: one prompt in, one answer out.

use pathwise_config::AppConfig;
use pathwise_core::error::CompletionError;
use pathwise_core::message::Message;
use pathwise_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends an assembled prompt to the completion provider.
///
/// Makes exactly one call per prompt. There is no retry and no local
/// timeout; the provider is responsible for reporting timeouts as errors.
#[derive(Clone)]
pub struct CompletionInvoker {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl CompletionInvoker {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Build an invoker using the model and sampling settings from config.
    ///
    /// A `default_model` set on the selected provider's table wins over the
    /// global one.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self::new(provider, model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `prompt` as a single user message and return the answer text.
    pub async fn invoke(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_chars = prompt.len(),
            "Invoking completion"
        );

        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(provider = self.provider.name(), "Completion failed: {e}");
            CompletionError::from(e)
        })?;

        let text = response.message.content;
        if text.trim().is_empty() {
            warn!(provider = self.provider.name(), "Completion returned no text");
            return Err(CompletionError::EmptyResponse);
        }

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }
        Ok(text)
    }
}
