use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// User-facing message returned when the local model server cannot answer.
pub const LOCAL_UNAVAILABLE_MESSAGE: &str =
    "Could not connect to the local Ollama server. Is it running?";

/// One completion call, independent of which provider serves it
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Failure classes a provider can report.
///
/// The gateway decides on fallback purely from the variant; nothing
/// downstream matches on message text.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} rate limited the request: {message}")]
    RateLimited {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} request failed with status {status}: {message}")]
    QuotaOrStatus {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Could not connect to the local Ollama server. Is it running? ({detail})")]
    LocalUnavailable { detail: String },

    #[error("unexpected {provider} error: {message}")]
    Unexpected {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Rate limiting and status failures from the primary are the only
    /// errors that hand the request over to the local model.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::QuotaOrStatus { .. }
        )
    }

    fn unexpected(provider: &'static str, err: impl std::fmt::Display) -> Self {
        ProviderError::Unexpected {
            provider,
            message: err.to_string(),
        }
    }

    fn local(err: impl std::fmt::Display) -> Self {
        ProviderError::LocalUnavailable {
            detail: err.to_string(),
        }
    }
}

/// Common interface for every model backend
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce the raw (untrimmed) completion text for a request
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Get the provider name for logging
    fn provider_name(&self) -> &'static str;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// Message structure for chat-completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI chat-completions provider, the primary tier
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<LLMMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: LLMMessage,
}

impl OpenAIProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: build_client(timeout),
            api_key,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
        }
    }

    fn build_messages(request: &CompletionRequest) -> Vec<LLMMessage> {
        let mut messages = Vec::with_capacity(2);

        if let Some(system) = &request.system {
            messages.push(LLMMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(LLMMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        messages
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        info!(
            provider = self.provider_name(),
            model = %self.model,
            base_url = %self.base_url,
            prompt_length = request.prompt.len(),
            max_tokens = request.max_tokens,
            temperature = ?request.temperature,
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ProviderError::unexpected(self.provider_name(), e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = self.provider_name(),
                status = %status,
                error = %error_text,
                "LLM API request failed"
            );
            return Err(classify_status(self.provider_name(), status, error_text));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::unexpected(self.provider_name(), e))?;

        let response_content = openai_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::unexpected(self.provider_name(), "no choices in response")
            })?;

        info!(
            provider = self.provider_name(),
            response_length = response_content.len(),
            "Successfully received LLM response"
        );

        Ok(response_content)
    }

    fn provider_name(&self) -> &'static str {
        "OpenAI"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Map a non-success status from the primary onto a fallback class
fn classify_status(provider: &'static str, status: StatusCode, message: String) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited { provider, message }
    } else {
        ProviderError::QuotaOrStatus {
            provider,
            status: status.as_u16(),
            message,
        }
    }
}

/// Ollama `/api/generate` provider, the local fallback tier.
///
/// Only the prompt text is forwarded; role instructions and sampling
/// parameters belong to the primary.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaProvider {
    pub const DEFAULT_ENDPOINT: &'static str = "http://127.0.0.1:11434/api/generate";
    pub const DEFAULT_MODEL: &'static str = "gemma";

    pub fn new(endpoint: Option<String>, model: Option<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            endpoint: endpoint.unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_string()),
            model: model.unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let request_body = OllamaRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
        };

        info!(
            provider = self.provider_name(),
            model = %self.model,
            endpoint = %self.endpoint,
            prompt_length = request.prompt.len(),
            "Making local LLM request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                error!(
                    provider = self.provider_name(),
                    endpoint = %self.endpoint,
                    error = %e,
                    "Local LLM request failed"
                );
                ProviderError::local(e)
            })?;

        let ollama_response: OllamaResponse = response.json().await.map_err(ProviderError::local)?;

        info!(
            provider = self.provider_name(),
            response_length = ollama_response.response.len(),
            "Successfully received local LLM response"
        );

        Ok(ollama_response.response)
    }

    fn provider_name(&self) -> &'static str {
        "Ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to build configured HTTP client, using defaults");
            Client::new()
        })
}
