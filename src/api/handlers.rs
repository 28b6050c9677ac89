//! HTTP handlers for the web API.

use super::types::*;
use super::AppState;
use crate::error::AppError;
use crate::formatter::{ai_format_prompt, format_text_to_markdown, strip_code_fences, FormatMethod};
use crate::llm::{build_messages, CompletionProfile};
use crate::poster::{
    ensure_html_document, load_prompt_template, poster_user_prompt, PosterId, PosterKind,
    POSTER_SYSTEM_PROMPT,
};
use crate::settings::{MaskedSettings, SettingsDefaults, SettingsPatch};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// URL prefix under which generated posters are served.
pub const POSTERS_ROUTE: &str = "/static/posters";

// ============================================================================
// Health
// ============================================================================

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        app: "mdposter",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Formatting
// ============================================================================

pub async fn format_article(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FormatArticleRequest>, JsonRejection>,
) -> Result<Json<FormatArticleResponse>, AppError> {
    let Json(request) = payload?;
    if request.content.trim().is_empty() {
        return Err(AppError::EmptyContent);
    }

    tracing::info!(
        chars = request.content.chars().count(),
        ai = request.use_ai_format,
        "formatting article"
    );

    let (formatted_content, method) = if request.use_ai_format {
        let settings = state.settings.snapshot();
        let messages = build_messages(&ai_format_prompt(&request.content), None, None);
        let content = state
            .llm
            .complete(&settings, &messages, CompletionProfile::FORMAT)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "AI formatting failed"))?;
        (strip_code_fences(&content), FormatMethod::Ai)
    } else {
        (format_text_to_markdown(&request.content), FormatMethod::Rule)
    };

    tracing::info!(
        method = method.label(),
        chars = formatted_content.chars().count(),
        "article formatted"
    );

    Ok(Json(FormatArticleResponse {
        success: true,
        formatted_content,
        method: method.label(),
    }))
}

// ============================================================================
// Posters
// ============================================================================

pub async fn generate_poster(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GeneratePosterRequest>, JsonRejection>,
) -> Result<Json<GeneratePosterResponse>, AppError> {
    let Json(request) = payload?;
    if request.content.trim().is_empty() {
        return Err(AppError::EmptyContent);
    }

    let kind = request
        .poster_type
        .as_deref()
        .map(PosterKind::parse)
        .unwrap_or_default();

    let template = load_prompt_template(&state.prompt_file);
    let user_prompt = poster_user_prompt(&template, kind, &request.content);
    tracing::info!(kind = kind.label(), prompt_chars = user_prompt.chars().count(), "generating poster");

    let settings = state.settings.snapshot();
    let messages = build_messages(&user_prompt, Some(POSTER_SYSTEM_PROMPT), None);
    let raw = state
        .llm
        .complete(&settings, &messages, CompletionProfile::POSTER)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "poster generation failed"))?;

    let html = ensure_html_document(&raw);
    let id = state.posters.save(&html).await?;

    Ok(Json(GeneratePosterResponse {
        success: true,
        poster_id: id.to_string(),
        poster_type: kind.label(),
        poster_url: format!("{}/{}", POSTERS_ROUTE, id.file_name()),
        download_url: format!("/api/download-poster/{}", id),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn download_poster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = PosterId::parse(&id)?;
    let html = state.posters.load(&id).await?;

    let disposition = format!("attachment; filename=\"{}\"", id.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    )
        .into_response())
}

// ============================================================================
// Settings handlers
// ============================================================================

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<MaskedSettings> {
    Json(state.settings.snapshot().masked())
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SettingsPatch>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(patch) = payload?;
    state.settings.update(patch);
    Ok(Json(MessageResponse {
        success: true,
        message: "配置更新成功",
    }))
}

pub async fn get_config_defaults(State(state): State<Arc<AppState>>) -> Json<SettingsDefaults> {
    Json(state.settings.defaults())
}

pub async fn test_ai(State(state): State<Arc<AppState>>) -> Result<Json<MessageResponse>, AppError> {
    let settings = state.settings.snapshot();
    state
        .llm
        .ping(&settings)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "AI connectivity test failed"))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "AI服务连接正常",
    }))
}
