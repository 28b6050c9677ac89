//! Poster generation and storage.
//!
//! A poster is a standalone HTML page produced by the model from an article.
//! Pages are written to a directory as `poster_<uuid>.html` and served back by
//! id. Nothing removes them.

use crate::error::AppError;
use crate::formatter::strip_code_fences;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const POSTER_SYSTEM_PROMPT: &str =
    "你是一位专业的网页和营销视觉设计师，擅长根据提示词生成完整的HTML页面。";

const FALLBACK_TEMPLATE: &str = "\n\
你是一位优秀的网页和营销视觉设计师。请根据用户提供的文章内容，生成对应类型的HTML封面代码。\n\
\n\
要求：\n\
1. 从文章内容中自动提取或生成合适的标题\n\
2. 生成完整的HTML代码，包含CSS样式\n\
3. 确保代码可以直接在浏览器中运行\n\
4. 根据内容类型自动选择合适的视觉风格\n\
5. 包含下载功能\n";

const DOCTYPE: &str = "<!DOCTYPE html>";

/// Target platform of a poster; decides the frame the model designs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PosterKind {
    #[default]
    Xiaohongshu,
    WechatOfficial,
}

impl PosterKind {
    /// Parse a user-supplied type, falling back to the default for unknown values.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "公众号" | "wechat" => Self::WechatOfficial,
            _ => Self::Xiaohongshu,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Xiaohongshu => "小红书",
            Self::WechatOfficial => "公众号",
        }
    }
}

impl fmt::Display for PosterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read the designer prompt template, or use the built-in one.
pub fn load_prompt_template(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(template) => template,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "using built-in poster prompt");
            FALLBACK_TEMPLATE.to_string()
        }
    }
}

/// Build the user prompt combining the template with the article.
pub fn poster_user_prompt(template: &str, kind: PosterKind, content: &str) -> String {
    format!(
        "请根据以下完整的提示词模板和用户输入，生成一个完整的HTML页面：\n\
         \n\
         ## 完整提示词模板：\n\
         {template}\n\
         \n\
         ## 用户输入：\n\
         - 封面类型：{kind}\n\
         - 文章内容：{content}\n\
         \n\
         请严格按照提示词模板中的规则进行分析和设计，生成一个完整的HTML页面代码。\
         HTML页面应该包含所有必要的CSS样式和JavaScript代码，可以直接在浏览器中运行。\n\
         \n\
         要求：\n\
         1. 从文章内容中自动提取或生成一个合适的标题\n\
         2. 根据封面类型（小红书/公众号）选择合适的框架\n\
         3. 根据内容特点自动匹配最适合的视觉风格\n\
         4. 生成完整的HTML+CSS+JS代码\n\
         5. 包含下载功能\n\
         6. 确保代码可直接在浏览器中运行"
    )
}

/// Make sure model output is a full HTML document.
///
/// Fragments are placed in the `<head>` of a minimal page, which keeps
/// `<style>`/`<script>`-only answers working.
pub fn ensure_html_document(raw: &str) -> String {
    let html = strip_code_fences(raw);
    if html.starts_with(DOCTYPE) {
        return html;
    }

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"zh-CN\">\n\
         <head>\n    \
         <meta charset=\"UTF-8\">\n    \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
         <title>海报</title>\n    \
         {html}\n\
         </head>\n\
         <body>\n\
         </body>\n\
         </html>"
    )
}

/// Identifier of a stored poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosterId(Uuid);

impl PosterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from a request path. Only UUIDs are accepted, so ids can
    /// never name a file outside the poster directory.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::InvalidPosterId(value.to_string()))
    }

    pub fn file_name(&self) -> String {
        format!("poster_{}.html", self.0)
    }
}

impl Default for PosterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PosterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Directory-backed poster storage.
#[derive(Debug, Clone)]
pub struct PosterStore {
    dir: PathBuf,
}

impl PosterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &PosterId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// Write a poster and return its id. The file exists once this returns.
    pub async fn save(&self, html: &str) -> Result<PosterId, AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let id = PosterId::new();
        let path = self.path_for(&id);
        tokio::fs::write(&path, html).await?;
        tracing::info!(poster_id = %id, bytes = html.len(), "poster saved");
        Ok(id)
    }

    pub async fn load(&self, id: &PosterId) -> Result<String, AppError> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::PosterNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
