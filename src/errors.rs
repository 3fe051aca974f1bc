use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

use crate::llm_providers::{LOCAL_UNAVAILABLE_MESSAGE, ProviderError};
use crate::models::ErrorResponse;
use crate::topic_store::TopicStoreError;

/// Generic message for provider failures; details stay in the server log
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred. Please check the server logs.";

/// Error half of every handler result
pub type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    DuplicateResource(String),

    #[error("Storage error: {0}")]
    StorageError(#[source] TopicStoreError),

    #[error("Local provider unavailable: {0}")]
    LocalProviderUnavailable(String),

    #[error("LLM service error: {0}")]
    LLMError(String),
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
            user_friendly_message: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl ApiError {
    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(self, context: ErrorContext) -> ErrorReply {
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                reply(StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::ValidationError(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Validation error"
                );
                reply(StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::DuplicateResource(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Duplicate resource"
                );
                reply(StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::StorageError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Storage error"
                );
                reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    context
                        .user_friendly_message
                        .unwrap_or_else(|| format!("Failed to access {}s. Please try again.", context.resource_type)),
                )
            }
            ApiError::LocalProviderUnavailable(message) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Local LLM fallback failed"
                );
                reply(StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            }
            ApiError::LLMError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "LLM service error"
                );
                reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    context
                        .user_friendly_message
                        .unwrap_or_else(|| UNEXPECTED_ERROR_MESSAGE.to_string()),
                )
            }
        }
    }
}

fn reply(status: StatusCode, message: String) -> ErrorReply {
    (status, Json(ErrorResponse { error: message }))
}

impl From<TopicStoreError> for ApiError {
    fn from(err: TopicStoreError) -> Self {
        match err {
            TopicStoreError::EmptyTopic => ApiError::ValidationError(err.to_string()),
            TopicStoreError::DuplicateTopic(_) => {
                ApiError::DuplicateResource("Topic already exists".to_string())
            }
            TopicStoreError::NotFound(_) => ApiError::NotFound("Topic not found".to_string()),
            other @ (TopicStoreError::Io(_) | TopicStoreError::Parse(_)) => {
                ApiError::StorageError(other)
            }
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::LocalUnavailable { .. } => {
                ApiError::LocalProviderUnavailable(LOCAL_UNAVAILABLE_MESSAGE.to_string())
            }
            other => ApiError::LLMError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respond(err: ApiError) -> ErrorReply {
        err.to_response_with_context(ErrorContext::new("test", "topic"))
    }

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("add_topic", "topic")
            .with_id("recursion")
            .with_user_message("Custom message");

        assert_eq!(context.operation, "add_topic");
        assert_eq!(context.resource_type, "topic");
        assert_eq!(context.resource_id, Some("recursion".to_string()));
        assert_eq!(
            context.user_friendly_message,
            Some("Custom message".to_string())
        );
    }

    #[test]
    fn test_topic_store_error_mapping() {
        let (status, body) = respond(ApiError::from(TopicStoreError::EmptyTopic));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.error, "Topic name is required");

        let (status, body) =
            respond(ApiError::from(TopicStoreError::DuplicateTopic("recursion".into())));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.error, "Topic already exists");

        let (status, body) =
            respond(ApiError::from(TopicStoreError::NotFound("closures".into())));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0.error, "Topic not found");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let (status, body) = ApiError::from(TopicStoreError::Io(io))
            .to_response_with_context(ErrorContext::new("add_topic", "topic"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.0.error.contains("read-only"));
    }

    #[test]
    fn test_provider_error_mapping_hides_details() {
        let err = ProviderError::Unexpected {
            provider: "OpenAI",
            message: "secret internal detail".into(),
        };
        let (status, body) = respond(ApiError::from(err));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0.error, UNEXPECTED_ERROR_MESSAGE);

        let err = ProviderError::RateLimited {
            provider: "OpenAI",
            message: "slow down".into(),
        };
        let (_, body) = ApiError::from(err).to_response_with_context(
            ErrorContext::new("explain_topic", "topic").with_user_message("Failed to get explanation"),
        );
        assert_eq!(body.0.error, "Failed to get explanation");
    }

    #[test]
    fn test_local_unavailable_returns_connectivity_message() {
        let err = ProviderError::LocalUnavailable {
            detail: "error sending request: connection refused".into(),
        };
        let (status, body) = respond(ApiError::from(err));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0.error, LOCAL_UNAVAILABLE_MESSAGE);
    }
}
