use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::LLMConfig;
use crate::llm_providers::{
    CompletionProvider, CompletionRequest, OllamaProvider, OpenAIProvider, ProviderError,
};

// Import logging macros
use crate::log_llm_operation;

/// Two-tier completion path: the hosted primary model, then the local model
/// when the primary is rate limited or rejects the request.
///
/// Each call makes at most one attempt per tier.
#[derive(Clone)]
pub struct ProviderGateway {
    primary: Arc<dyn CompletionProvider>,
    secondary: Arc<dyn CompletionProvider>,
}

impl ProviderGateway {
    pub fn new(primary: Arc<dyn CompletionProvider>, secondary: Arc<dyn CompletionProvider>) -> Self {
        Self { primary, secondary }
    }

    /// Build both provider clients from configuration
    pub fn from_config(config: &LLMConfig) -> Self {
        let primary = OpenAIProvider::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.model.clone(),
            config.timeout,
        );
        let secondary = OllamaProvider::new(
            Some(config.local_endpoint.clone()),
            Some(config.local_model.clone()),
            config.timeout,
        );

        Self::new(Arc::new(primary), Arc::new(secondary))
    }

    pub fn primary_name(&self) -> &'static str {
        self.primary.provider_name()
    }

    pub fn secondary_name(&self) -> &'static str {
        self.secondary.provider_name()
    }

    /// Complete a request, falling back to the local provider on
    /// rate-limit or status failures from the primary.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let started = Instant::now();

        match self.primary.complete(request).await {
            Ok(text) => {
                log_llm_operation!(
                    success,
                    "complete",
                    provider = self.primary.provider_name(),
                    duration_ms = started.elapsed().as_millis() as u64
                );
                Ok(text.trim().to_string())
            }
            Err(err) if err.triggers_fallback() => {
                log_llm_operation!(
                    fallback,
                    "complete",
                    from = self.primary.provider_name(),
                    to = self.secondary.provider_name(),
                    error = err
                );

                let text = self.secondary.complete(request).await.map_err(|local_err| {
                    log_llm_operation!(
                        error,
                        "complete",
                        provider = self.secondary.provider_name(),
                        error = local_err
                    );
                    local_err
                })?;

                log_llm_operation!(
                    success,
                    "complete",
                    provider = self.secondary.provider_name(),
                    duration_ms = started.elapsed().as_millis() as u64
                );
                Ok(text.trim().to_string())
            }
            Err(err) => {
                log_llm_operation!(
                    error,
                    "complete",
                    provider = self.primary.provider_name(),
                    error = err
                );
                Err(into_unexpected(self.primary.provider_name(), err))
            }
        }
    }

    /// Complete a request against the primary provider only.
    pub async fn complete_primary_only(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        debug!(
            provider = self.primary.provider_name(),
            "Completing without local fallback"
        );

        match self.primary.complete(request).await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(err) => {
                log_llm_operation!(
                    error,
                    "complete_primary_only",
                    provider = self.primary.provider_name(),
                    error = err
                );
                Err(err)
            }
        }
    }
}

/// Anything the primary reports outside the fallback classes surfaces as
/// `Unexpected`, whatever its original variant.
fn into_unexpected(provider: &'static str, err: ProviderError) -> ProviderError {
    match err {
        unexpected @ ProviderError::Unexpected { .. } => unexpected,
        other => ProviderError::Unexpected {
            provider,
            message: other.to_string(),
        },
    }
}
