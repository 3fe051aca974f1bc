pub mod logging;

pub mod api;
pub mod assets;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod llm_providers;
pub mod models;
pub mod prompts;
pub mod quiz_service;
pub mod topic_store;

pub use api::{AppState, create_router};
pub use config::{Config, Environment};
pub use errors::*;
pub use gateway::ProviderGateway;
pub use llm_providers::{
    CompletionProvider, CompletionRequest, OllamaProvider, OpenAIProvider, ProviderError,
};
pub use models::*;
pub use quiz_service::QuizService;
pub use topic_store::{TopicStore, TopicStoreError};
