use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::Environment;

/// Page assets served at the site root, with their content types
const PAGE_ASSETS: [(&str, &str); 3] = [
    ("index.html", "text/html; charset=utf-8"),
    ("styles.css", "text/css"),
    ("app.js", "application/javascript"),
];

/// Serves the quiz page.
///
/// Production reads every asset once at startup; development re-reads from
/// disk on each request so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    dir: PathBuf,
    preloaded: Option<Arc<HashMap<&'static str, String>>>,
}

impl StaticAssets {
    pub async fn load(dir: impl Into<PathBuf>, environment: Environment) -> Self {
        let dir = dir.into();

        if environment.is_development() {
            debug!(dir = %dir.display(), "Serving static assets from disk on every request");
            return Self { dir, preloaded: None };
        }

        let mut preloaded = HashMap::new();
        for (name, _) in PAGE_ASSETS {
            match fs::read_to_string(dir.join(name)).await {
                Ok(content) => {
                    preloaded.insert(name, content);
                }
                Err(e) => warn!(asset = name, dir = %dir.display(), error = %e, "Static asset unavailable"),
            }
        }

        Self {
            dir,
            preloaded: Some(Arc::new(preloaded)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn fetch(&self, name: &'static str) -> Option<String> {
        match &self.preloaded {
            Some(cache) => cache.get(name).cloned(),
            None => fs::read_to_string(self.dir.join(name)).await.ok(),
        }
    }

    async fn respond(&self, name: &'static str) -> Response {
        let content_type = PAGE_ASSETS
            .iter()
            .find(|(asset, _)| *asset == name)
            .map(|(_, content_type)| *content_type)
            .unwrap_or("application/octet-stream");

        match self.fetch(name).await {
            Some(content) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                content,
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

async fn serve_index(State(assets): State<StaticAssets>) -> Response {
    assets.respond("index.html").await
}

async fn serve_css(State(assets): State<StaticAssets>) -> Response {
    assets.respond("styles.css").await
}

async fn serve_js(State(assets): State<StaticAssets>) -> Response {
    assets.respond("app.js").await
}

pub fn create_router(assets: StaticAssets) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/index.html", get(serve_index))
        .route("/styles.css", get(serve_css))
        .route("/app.js", get(serve_js))
        .with_state(assets)
}
