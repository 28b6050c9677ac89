//! Configuration management for mdposter.
//!
//! Loads settings from `~/.config/mdposter/config.toml` with environment overrides.
//! The `[ai]` section seeds the runtime settings the web UI can later change.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SERVICE_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_posters_dir")]
    pub posters_dir: PathBuf,
    #[serde(default = "default_prompt_file")]
    pub prompt_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    #[serde(default = "default_browser")]
    pub browser: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub log_verbosity: LogVerbosity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    Minimal,
    #[default]
    Compact,
    Verbose,
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5000 }
fn default_posters_dir() -> PathBuf { PathBuf::from("static").join("posters") }
fn default_prompt_file() -> PathBuf { PathBuf::from("prompt").join("提示词.md") }
fn default_service_url() -> String { DEFAULT_SERVICE_URL.to_string() }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_browser() -> String { "chromium".to_string() }
fn default_width() -> u32 { 1200 }
fn default_height() -> u32 { 630 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            posters_dir: default_posters_dir(),
            prompt_file: default_prompt_file(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            browser: default_browser(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mdposter")
            .join("config.toml")
    }

    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("API_BASE_URL") {
            if !url.trim().is_empty() {
                self.ai.service_url = url;
            }
        }
        if let Ok(key) = std::env::var("API_KEY") {
            self.ai.api_key = key;
        }
        if let Ok(model) = std::env::var("MODEL_NAME") {
            if !model.trim().is_empty() {
                self.ai.model = model;
            }
        }
        if let Ok(val) = std::env::var("MDPOSTER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        self
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&path, content).map_err(ConfigError::Io)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_config_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, r#"
[server]
port = 9090
posters_dir = "/tmp/posters"

[ai]
service_url = "https://open.bigmodel.cn/api/paas/v4"
api_key = "sk-test"
model = "glm-4"
"#).unwrap();

        let config = Config::load_from(config_path).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.posters_dir, PathBuf::from("/tmp/posters"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.ai.api_key, "sk-test");
        assert_eq!(config.ai.model, "glm-4");
    }

    #[test]
    fn returns_defaults_when_file_missing() {
        let config = Config::load_from(PathBuf::from("/nonexistent/path/config.toml")).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.ai.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.ai.model, DEFAULT_MODEL);
        assert!(config.ai.api_key.is_empty());
        assert_eq!(config.render.width, 1200);
        assert_eq!(config.render.height, 630);
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[server\nport = ").unwrap();

        let result = Config::load_from(config_path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_take_precedence_over_file() {
        std::env::remove_var("MODEL_NAME");

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[ai]\nmodel = \"from-file\"\n").unwrap();

        let config_from_file = Config::load_from(config_path.clone()).unwrap();
        assert_eq!(config_from_file.ai.model, "from-file");

        std::env::set_var("MODEL_NAME", "from-env");
        let config = Config::load_from(config_path).unwrap().with_env_overrides();
        assert_eq!(config.ai.model, "from-env");

        std::env::remove_var("MODEL_NAME");
    }

    #[test]
    fn saves_config_to_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nested").join("config.toml");

        let config = Config {
            server: ServerConfig { port: 3000, ..ServerConfig::default() },
            ..Config::default()
        };

        config.save_to(config_path.clone()).unwrap();

        let loaded = Config::load_from(config_path).unwrap();
        assert_eq!(loaded.server.port, 3000);
    }

    #[test]
    fn written_default_config_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        Config::default().save_to(config_path.clone()).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        for section in ["[server]", "[ai]", "[render]", "[app]"] {
            assert!(content.contains(section), "missing {}", section);
        }
        assert_eq!(Config::load_from(config_path).unwrap(), Config::default());
    }

    #[test]
    fn parses_all_log_verbosity_levels() {
        let dir = tempfile::tempdir().unwrap();

        for (value, expected) in [
            ("minimal", LogVerbosity::Minimal),
            ("compact", LogVerbosity::Compact),
            ("verbose", LogVerbosity::Verbose),
        ] {
            let config_path = dir.path().join(format!("config_{}.toml", value));
            fs::write(&config_path, format!("[app]\nlog_verbosity = \"{}\"\n", value)).unwrap();

            let config = Config::load_from(config_path).unwrap();
            assert_eq!(config.app.log_verbosity, expected);
        }
    }
}
