#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use quiz_tutor::{
    AppState, CompletionProvider, CompletionRequest, ProviderError, ProviderGateway, QuizService,
    TopicStore, create_router,
};
use tempfile::TempDir;

/// What a scripted provider does on every call
#[derive(Clone)]
pub enum Script {
    Reply(String),
    RateLimited,
    Status(u16),
    Broken,
    LocalDown,
}

/// In-memory provider that records every request it receives
pub struct ScriptedProvider {
    name: &'static str,
    script: Script,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name,
            script,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(name: &'static str, text: &str) -> Arc<Self> {
        Self::new(name, Script::Reply(text.to_string()))
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.seen.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::RateLimited => Err(ProviderError::RateLimited {
                provider: self.name,
                message: "Rate limit reached for gpt-4o-mini".into(),
            }),
            Script::Status(status) => Err(ProviderError::QuotaOrStatus {
                provider: self.name,
                status: *status,
                message: "You exceeded your current quota".into(),
            }),
            Script::Broken => Err(ProviderError::Unexpected {
                provider: self.name,
                message: "connection reset by peer".into(),
            }),
            Script::LocalDown => Err(ProviderError::LocalUnavailable {
                detail: "error sending request: connection refused".into(),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Test server with a throwaway topic file and scripted providers
pub struct TestApp {
    pub server: TestServer,
    pub primary: Arc<ScriptedProvider>,
    pub secondary: Arc<ScriptedProvider>,
    pub store: TopicStore,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(primary: Script, secondary: Script) -> Self {
        let dir = TempDir::new().unwrap();
        let store = TopicStore::new(dir.path().join("topics.json"));

        let primary = ScriptedProvider::new("OpenAI", primary);
        let secondary = ScriptedProvider::new("Ollama", secondary);
        let gateway = ProviderGateway::new(primary.clone(), secondary.clone());

        let state = AppState {
            topic_store: store.clone(),
            quiz_service: QuizService::new(gateway),
        };
        let server = TestServer::new(create_router(state)).unwrap();

        Self {
            server,
            primary,
            secondary,
            store,
            _dir: dir,
        }
    }

    /// Primary answers everything with `reply`
    pub fn with_reply(reply: &str) -> Self {
        Self::new(Script::Reply(reply.to_string()), Script::Reply("local".to_string()))
    }

    pub fn provider_calls(&self) -> usize {
        self.primary.calls().len() + self.secondary.calls().len()
    }
}
