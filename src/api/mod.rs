//! Web API for article formatting and poster generation.
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /api/format-article - Format article text as Markdown (rules or AI)
//! - POST /api/generate-poster - Generate an HTML poster from an article
//! - GET /api/download-poster/:id - Download a generated poster
//! - GET /static/posters/* - View generated posters
//! - GET /api/config - Current AI settings (key masked)
//! - POST /api/config - Update AI settings
//! - GET /api/config/defaults - Startup AI settings
//! - POST /api/test-ai - Connectivity test against the AI service

mod handlers;
mod types;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_embed::Embed;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::poster::PosterStore;
use crate::settings::{AiSettings, SharedSettings};

pub use handlers::POSTERS_ROUTE;
pub use types::*;

#[derive(Embed)]
#[folder = "static/"]
#[exclude = "posters/*"]
struct StaticAssets;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: SharedSettings,
    pub posters: PosterStore,
    pub llm: LlmClient,
    pub prompt_file: PathBuf,
}

impl AppState {
    /// Build state from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            settings: SharedSettings::new(AiSettings::from(&config.ai)),
            posters: PosterStore::new(&config.server.posters_dir),
            llm: LlmClient::new(),
            prompt_file: config.server.prompt_file.clone(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Create the API router.
pub fn create_router() -> Router {
    create_router_with_state(AppState::default())
}

/// Create the API router with custom state.
pub fn create_router_with_state(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let posters = ServeDir::new(state.posters.dir());

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/format-article", post(handlers::format_article))
        .route("/api/generate-poster", post(handlers::generate_poster))
        .route("/api/download-poster/{id}", get(handlers::download_poster))
        .route("/api/config", get(handlers::get_config).post(handlers::update_config))
        .route("/api/config/defaults", get(handlers::get_config_defaults))
        .route("/api/test-ai", post(handlers::test_ai))
        .with_state(Arc::new(state))
        .nest_service(POSTERS_ROUTE, posters)
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve embedded static files
async fn static_handler(uri: axum::http::Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');
    let path = match path {
        "" => "index.html",
        "config" => "config.html",
        other => other,
    };

    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();
            ([(header::CONTENT_TYPE, mime)], content.data.into_owned()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}
