//! Offline article + cover pipeline.
//!
//! Reads a Markdown article and a designer prompt from disk, has the model
//! rewrite the article for a WeChat official account, generates a cover page
//! for the rewritten title and rasterizes it to PNG.

use crate::error::AppError;
use crate::llm::{build_messages, CompletionProfile, LlmClient};
use crate::poster::ensure_html_document;
use crate::render::HtmlRenderer;
use crate::settings::AiSettings;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const REWRITE_SYSTEM_PROMPT: &str =
    "请将以下文章内容转换为适合微信公众号发布的格式，保持专业性和可读性。";

pub const COVER_SYSTEM_PROMPT: &str =
    "你是一位专业的网页和营销视觉设计师，根据用户提供的标题内容生成公众号封面HTML代码。";

pub const REWRITTEN_ARTICLE_FILE: &str = "文章_公众号版.md";
pub const COVER_HTML_FILE: &str = "cover_temp.html";

const UNTITLED: &str = "Untitled";

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]").unwrap());

/// First level-one Markdown heading, or `Untitled`.
pub fn extract_title(article: &str) -> String {
    article
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Replace everything but letters, digits and `_` so the title is a safe file stem.
pub fn file_safe_title(title: &str) -> String {
    NON_WORD.replace_all(title, "_").into_owned()
}

pub fn cover_user_prompt(title: &str) -> String {
    format!("请根据这个标题：{}生成一个适合微信公众号的封面HTML代码。", title)
}

/// Files produced by a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverOutput {
    pub title: String,
    pub article_path: PathBuf,
    pub html_path: PathBuf,
    pub png_path: PathBuf,
}

/// The rewrite → title → cover → PNG pipeline.
pub struct CoverPipeline {
    llm: LlmClient,
    settings: AiSettings,
    renderer: HtmlRenderer,
    out_dir: PathBuf,
}

impl CoverPipeline {
    pub fn new(settings: AiSettings, renderer: HtmlRenderer, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            llm: LlmClient::new(),
            settings,
            renderer,
            out_dir: out_dir.into(),
        }
    }

    /// Rewrite the article and write it to the output directory.
    pub async fn rewrite_article(&self, article: &str) -> Result<(String, PathBuf), AppError> {
        let messages = build_messages(article, Some(REWRITE_SYSTEM_PROMPT), None);
        let rewritten = self
            .llm
            .complete(&self.settings, &messages, CompletionProfile::COVER)
            .await?;

        let path = self.out_dir.join(REWRITTEN_ARTICLE_FILE);
        write_output(&path, &rewritten).await?;
        Ok((rewritten, path))
    }

    /// Generate the cover page for `title`, using the prompt file as memory.
    pub async fn generate_cover(&self, title: &str, memory: &str) -> Result<(String, PathBuf), AppError> {
        let messages = build_messages(&cover_user_prompt(title), Some(COVER_SYSTEM_PROMPT), Some(memory));
        let raw = self
            .llm
            .complete(&self.settings, &messages, CompletionProfile::COVER)
            .await?;
        let html = ensure_html_document(&raw);

        let path = self.out_dir.join(COVER_HTML_FILE);
        write_output(&path, &html).await?;
        Ok((html, path))
    }

    pub fn png_path_for(&self, title: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}-公众号封面.png", file_safe_title(title)))
    }

    /// Run the whole pipeline.
    pub async fn run(&self, article_path: &Path, prompt_path: &Path) -> Result<CoverOutput, AppError> {
        let article = read_input(article_path).await?;
        let memory = read_input(prompt_path).await?;

        tracing::info!(article = %article_path.display(), "rewriting article");
        let (rewritten, article_out) = self.rewrite_article(&article).await?;

        let title = extract_title(&rewritten);
        tracing::info!(%title, "generating cover");
        let (_, html_path) = self.generate_cover(&title, &memory).await?;

        let png_path = self.png_path_for(&title);
        self.renderer.render_file(&html_path, &png_path).await?;

        Ok(CoverOutput {
            title,
            article_path: article_out,
            html_path,
            png_path,
        })
    }
}

async fn read_input(path: &Path) -> Result<String, AppError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Io(format!("{}: {}", path.display(), e)))?;
    if content.trim().is_empty() {
        return Err(AppError::EmptyContent);
    }
    Ok(content)
}

async fn write_output(path: &Path, content: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    tracing::info!(path = %path.display(), "file saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_h1() {
        let article = "intro\n## Not this\n  # 真正的标题  \n# Second";
        assert_eq!(extract_title(article), "真正的标题");
    }

    #[test]
    fn untitled_without_h1() {
        assert_eq!(extract_title("## only h2\ntext"), "Untitled");
        assert_eq!(extract_title("#NoSpace"), "Untitled");
    }

    #[test]
    fn sanitizes_titles_for_file_names() {
        assert_eq!(file_safe_title("Rust 入门: 第1课!"), "Rust_入门__第1课_");
        assert_eq!(file_safe_title("a/b\\c"), "a_b_c");
    }

    #[test]
    fn png_path_uses_safe_title() {
        let pipeline = CoverPipeline::new(
            AiSettings {
                service_url: String::new(),
                api_key: String::new(),
                model: String::new(),
            },
            HtmlRenderer::new("chromium", 1200, 630),
            "/tmp/out",
        );
        assert_eq!(
            pipeline.png_path_for("你好 世界"),
            PathBuf::from("/tmp/out/你好_世界-公众号封面.png")
        );
    }

    fn completion(content: &str) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    #[tokio::test]
    async fn writes_article_and_cover_before_rendering() {
        let mut server = mockito::Server::new_async().await;
        let rewrite = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Regex("保持专业性和可读性".to_string()))
            .with_status(200)
            .with_body(completion("# 新标题\n\n正文"))
            .create_async()
            .await;
        let cover = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Regex("记忆内容: 暖色调".to_string()))
            .with_status(200)
            .with_body(completion("<div>cover</div>"))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let article_path = dir.path().join("文章.md");
        let prompt_path = dir.path().join("提示词.md");
        std::fs::write(&article_path, "# 旧标题\n正文").unwrap();
        std::fs::write(&prompt_path, "暖色调").unwrap();

        let out_dir = dir.path().join("output");
        let pipeline = CoverPipeline::new(
            AiSettings {
                service_url: format!("{}/chat/completions", server.url()),
                api_key: "sk-test".to_string(),
                model: "glm".to_string(),
            },
            HtmlRenderer::new("definitely-not-a-browser-binary", 1200, 630),
            &out_dir,
        );

        let result = pipeline.run(&article_path, &prompt_path).await;

        rewrite.assert_async().await;
        cover.assert_async().await;
        assert!(matches!(result, Err(AppError::RenderFailed(_))));

        let article = std::fs::read_to_string(out_dir.join(REWRITTEN_ARTICLE_FILE)).unwrap();
        assert_eq!(article, "# 新标题\n\n正文");
        let html = std::fs::read_to_string(out_dir.join(COVER_HTML_FILE)).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div>cover</div>"));
    }

    #[tokio::test]
    async fn missing_article_fails_early() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = CoverPipeline::new(
            AiSettings {
                service_url: "http://127.0.0.1:1/chat/completions".to_string(),
                api_key: "sk".to_string(),
                model: "m".to_string(),
            },
            HtmlRenderer::new("chromium", 1200, 630),
            dir.path(),
        );

        let result = pipeline
            .run(&dir.path().join("missing.md"), &dir.path().join("prompt.md"))
            .await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
