//! HTML to PNG rasterization.
//!
//! Delegates to a headless Chromium-family browser's `--screenshot` mode.
//! Any binary accepting the same flags (chromium, google-chrome, msedge)
//! works.

use crate::config::RenderConfig;
use crate::error::AppError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use url::Url;

/// Renders HTML files to PNG through an external browser.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    browser: String,
    width: u32,
    height: u32,
}

impl HtmlRenderer {
    pub fn new(browser: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            browser: browser.into(),
            width,
            height,
        }
    }

    /// Browser command line for rendering `html_path` into `png_path`.
    ///
    /// `html_path` must be absolute.
    pub fn args(&self, html_path: &Path, png_path: &Path) -> Result<Vec<String>, AppError> {
        Ok(vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--screenshot={}", png_path.display()),
            format!("--window-size={},{}", self.width, self.height),
            file_url(html_path)?,
        ])
    }

    /// Render an HTML file on disk to a PNG.
    pub async fn render_file(&self, html_path: &Path, png_path: &Path) -> Result<(), AppError> {
        let html_path = absolute(html_path)?;
        let png_path = absolute(png_path)?;

        tracing::info!(browser = %self.browser, png = %png_path.display(), "rasterizing cover");

        let output = Command::new(&self.browser)
            .args(self.args(&html_path, &png_path)?)
            .output()
            .await
            .map_err(|e| AppError::RenderFailed(format!("could not start '{}': {}", self.browser, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::RenderFailed(format!(
                "'{}' exited with {}: {}",
                self.browser,
                output.status,
                stderr.trim()
            )));
        }

        if !tokio::fs::try_exists(&png_path).await.unwrap_or(false) {
            return Err(AppError::RenderFailed(format!(
                "'{}' produced no screenshot",
                self.browser
            )));
        }

        Ok(())
    }
}

impl From<&RenderConfig> for HtmlRenderer {
    fn from(config: &RenderConfig) -> Self {
        Self::new(config.browser.clone(), config.width, config.height)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, AppError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn file_url(path: &Path) -> Result<String, AppError> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|_| AppError::RenderFailed(format!("not an absolute path: {}", path.display())))
}
