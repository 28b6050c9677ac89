//! Unified error handling for mdposter.
//!
//! Provides a consistent error type across the server and the cover pipeline.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Unified error type for mdposter operations.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Request was missing required input.
    EmptyContent,
    /// Request body was not valid JSON for the endpoint.
    InvalidBody(String),
    /// No API key configured for the chat-completions service.
    ApiKeyMissing,
    /// Upstream answered with a non-success status.
    UpstreamStatus { status: u16, detail: String },
    /// Upstream could not be reached.
    Upstream(String),
    /// Upstream answered 200 but carried no completion.
    EmptyCompletion,
    /// Failed to parse upstream response.
    ParseError(String),
    /// Poster id is not a valid identifier.
    InvalidPosterId(String),
    /// Poster file does not exist.
    PosterNotFound(String),
    /// HTML could not be rasterized.
    RenderFailed(String),
    /// Filesystem error.
    Io(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "内容不能为空"),
            Self::InvalidBody(msg) => write!(f, "请求格式错误: {}", msg),
            Self::ApiKeyMissing => write!(f, "AI API密钥未配置"),
            Self::UpstreamStatus { status, detail } => {
                if detail.is_empty() {
                    write!(f, "AI服务返回错误 {}", status)
                } else {
                    write!(f, "AI服务返回错误 {}: {}", status, detail)
                }
            }
            Self::Upstream(msg) => write!(f, "连接失败: {}", msg),
            Self::EmptyCompletion => write!(f, "AI服务响应中没有可用的内容"),
            Self::ParseError(msg) => write!(f, "AI服务响应解析失败: {}", msg),
            Self::InvalidPosterId(id) => write!(f, "海报ID无效: {}", id),
            Self::PosterNotFound(_) => write!(f, "海报文件不存在"),
            Self::RenderFailed(msg) => write!(f, "封面渲染失败: {}", msg),
            Self::Io(msg) => write!(f, "文件读写失败: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// Error response structure for JSON serialization.
#[derive(Serialize)]
struct ErrorResponseBody {
    error: String,
    r#type: &'static str,
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyContent | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::ApiKeyMissing => StatusCode::BAD_REQUEST,
            Self::InvalidPosterId(_) => StatusCode::BAD_REQUEST,
            Self::PosterNotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamStatus { .. }
            | Self::Upstream(_)
            | Self::EmptyCompletion
            | Self::ParseError(_)
            | Self::RenderFailed(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::EmptyContent | Self::InvalidBody(_) | Self::InvalidPosterId(_) => "invalid_request",
            Self::ApiKeyMissing => "configuration_error",
            Self::UpstreamStatus { .. }
            | Self::Upstream(_)
            | Self::EmptyCompletion
            | Self::ParseError(_) => "upstream_error",
            Self::PosterNotFound(_) => "not_found",
            Self::RenderFailed(_) | Self::Io(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponseBody {
            error: self.to_string(),
            r#type: self.error_type(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_is_bad_request() {
        let err = AppError::EmptyContent;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "内容不能为空");
    }

    #[test]
    fn missing_poster_is_not_found() {
        let err = AppError::PosterNotFound("abc".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_type(), "not_found");
    }

    #[test]
    fn upstream_status_includes_code_and_detail() {
        let err = AppError::UpstreamStatus {
            status: 401,
            detail: "invalid key".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "AI服务返回错误 401: invalid key");
        assert_eq!(err.error_type(), "upstream_error");
    }

    #[test]
    fn transport_failure_is_prefixed() {
        let err = AppError::Upstream("connection refused".to_string());
        assert!(err.to_string().starts_with("连接失败: "));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
        assert_eq!(err.error_type(), "internal_error");
        assert!(err.to_string().starts_with("文件读写失败: "));
    }

    #[test]
    fn invalid_body_is_bad_request() {
        let err = AppError::InvalidBody("expected value".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_type(), "invalid_request");
        assert_eq!(err.to_string(), "请求格式错误: expected value");
    }

    #[test]
    fn messages_are_localized() {
        let errors = [
            AppError::ParseError("x".to_string()),
            AppError::InvalidPosterId("x".to_string()),
            AppError::RenderFailed("x".to_string()),
            AppError::Io("x".to_string()),
        ];
        for err in errors {
            let message = err.to_string();
            assert!(!message.is_ascii(), "{}", message);
        }
    }

    #[test]
    fn into_response_uses_status_code() {
        let response = AppError::ApiKeyMissing.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<AppError>();
    }
}
