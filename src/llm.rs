//! Chat-completions client.
//!
//! Speaks the OpenAI chat-completions shape: POST `{model, messages, ...}` and
//! read `choices[0].message.content` back. Works against any vendor that
//! follows the convention once the base URL is normalized.

use crate::error::AppError;
use crate::http::{create_client_with_timeout, DEFAULT_TIMEOUT, PING_TIMEOUT, POSTER_TIMEOUT};
use crate::settings::AiSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const COMPLETIONS_SUFFIX: &str = "/chat/completions";

/// Maximum number of upstream body characters echoed back in errors.
const ERROR_DETAIL_CHARS: usize = 200;

/// Normalize a service URL so it points at the chat-completions endpoint.
///
/// Known vendors get their completion path filled in; anything else is
/// trusted as given.
pub fn normalize_api_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() || url.ends_with(COMPLETIONS_SUFFIX) {
        return url.to_string();
    }

    if url.contains("openai.com") {
        if url.contains("/v1/") {
            url.replace("/v1/", "/v1/chat/completions")
        } else if url.ends_with("/v1") {
            format!("{}{}", url, COMPLETIONS_SUFFIX)
        } else {
            format!("{}/v1/chat/completions", url)
        }
    } else if url.contains("bigmodel.cn") {
        if url.contains("/api/paas/v4") {
            url.replace("/api/paas/v4", "/api/paas/v4/chat/completions")
        } else if url.contains("/v4/") {
            url.replace("/v4/", "/v4/chat/completions")
        } else {
            format!("{}/api/paas/v4/chat/completions", url)
        }
    } else {
        url.to_string()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Sampling parameters and timeout for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionProfile {
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl CompletionProfile {
    /// Article layout: low temperature, short budget.
    pub const FORMAT: Self = Self {
        temperature: Some(0.3),
        max_tokens: 2000,
        timeout: DEFAULT_TIMEOUT,
    };

    /// Poster generation: full HTML pages need a large budget and patience.
    pub const POSTER: Self = Self {
        temperature: Some(0.7),
        max_tokens: 16000,
        timeout: POSTER_TIMEOUT,
    };

    /// Offline cover pipeline rewrite and cover calls.
    pub const COVER: Self = Self {
        temperature: Some(0.7),
        max_tokens: 2000,
        timeout: POSTER_TIMEOUT,
    };

    /// Connectivity check.
    pub const PING: Self = Self {
        temperature: None,
        max_tokens: 50,
        timeout: PING_TIMEOUT,
    };
}

/// Message used by the connectivity test.
pub const PING_MESSAGE: &str = "你好，这是一个测试消息";

/// Client for a chat-completions endpoint.
#[derive(Debug, Clone, Default)]
pub struct LlmClient;

impl LlmClient {
    pub fn new() -> Self {
        Self
    }

    /// Send `messages` and return the trimmed content of the first choice.
    pub async fn complete(
        &self,
        settings: &AiSettings,
        messages: &[ChatMessage],
        profile: CompletionProfile,
    ) -> Result<String, AppError> {
        let text = self.send(settings, messages, profile).await?;

        let body: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            AppError::ParseError(format!(
                "{} | Response: {}",
                e,
                truncate_chars(&text, ERROR_DETAIL_CHARS)
            ))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or(AppError::EmptyCompletion)?;

        tracing::debug!(chars = content.chars().count(), "chat completion received");
        Ok(content)
    }

    /// Issue a minimal completion to verify URL, key and model.
    ///
    /// Any 2xx answer counts as reachable; the body is not inspected.
    pub async fn ping(&self, settings: &AiSettings) -> Result<(), AppError> {
        self.send(settings, &[ChatMessage::user(PING_MESSAGE)], CompletionProfile::PING)
            .await
            .map(|_| ())
    }

    /// POST the request and return the raw body of a successful answer.
    async fn send(
        &self,
        settings: &AiSettings,
        messages: &[ChatMessage],
        profile: CompletionProfile,
    ) -> Result<String, AppError> {
        if settings.api_key.trim().is_empty() {
            return Err(AppError::ApiKeyMissing);
        }

        let request = ChatRequest {
            model: &settings.model,
            messages,
            temperature: profile.temperature,
            max_tokens: Some(profile.max_tokens),
            stream: false,
        };

        tracing::debug!(
            url = %settings.service_url,
            model = %settings.model,
            messages = messages.len(),
            "sending chat completion"
        );

        let client = create_client_with_timeout(profile.timeout);
        let response = client
            .post(&settings.service_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", settings.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "chat completion rejected");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                detail: truncate_chars(&text, ERROR_DETAIL_CHARS),
            });
        }

        Ok(text)
    }
}

/// Build a message list: optional system prompt, optional memory, then the user turn.
pub fn build_messages(prompt: &str, system_prompt: Option<&str>, memory: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(3);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(system));
    }
    if let Some(memory) = memory.filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(format!("记忆内容: {}", memory)));
    }
    messages.push(ChatMessage::user(prompt));
    messages
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
