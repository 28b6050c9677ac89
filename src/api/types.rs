//! Request and response types for the web API.

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app: &'static str,
    pub version: &'static str,
}

#[derive(Deserialize)]
pub struct FormatArticleRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "useAiFormat")]
    pub use_ai_format: bool,
}

#[derive(Serialize)]
pub struct FormatArticleResponse {
    pub success: bool,
    pub formatted_content: String,
    pub method: &'static str,
}

#[derive(Deserialize)]
pub struct GeneratePosterRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub poster_type: Option<String>,
}

#[derive(Serialize)]
pub struct GeneratePosterResponse {
    pub success: bool,
    pub poster_id: String,
    pub poster_type: &'static str,
    pub poster_url: String,
    pub download_url: String,
    pub generated_at: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}
