//! Runtime AI settings.
//!
//! Seeded from [`Config`](crate::config::Config) at startup and changed through
//! the settings endpoint. Changes live in memory only; restarting the server
//! returns to the configured defaults.

use crate::config::AiConfig;
use crate::llm::normalize_api_url;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Characters shown in place of a configured API key.
const KEY_MASK: &str = "********************";

/// Connection settings for the chat-completions service.
#[derive(Debug, Clone, PartialEq)]
pub struct AiSettings {
    pub service_url: String,
    pub api_key: String,
    pub model: String,
}

impl From<&AiConfig> for AiSettings {
    fn from(config: &AiConfig) -> Self {
        Self {
            service_url: normalize_api_url(&config.service_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

/// Settings as exposed over HTTP, key masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskedSettings {
    pub ai_service_url: String,
    pub ai_api_key: String,
    pub ai_model: String,
}

/// Defaults used to initialise the settings form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsDefaults {
    pub ai_service_url: String,
    pub ai_model: String,
    pub has_api_key: bool,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub ai_service_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: Option<String>,
}

impl AiSettings {
    pub fn masked(&self) -> MaskedSettings {
        MaskedSettings {
            ai_service_url: self.service_url.clone(),
            ai_api_key: if self.api_key.is_empty() {
                String::new()
            } else {
                KEY_MASK.to_string()
            },
            ai_model: self.model.clone(),
        }
    }
}

/// Shared, lock-guarded settings plus the startup defaults they came from.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    current: Arc<RwLock<AiSettings>>,
    defaults: Arc<AiSettings>,
}

impl SharedSettings {
    pub fn new(defaults: AiSettings) -> Self {
        Self {
            current: Arc::new(RwLock::new(defaults.clone())),
            defaults: Arc::new(defaults),
        }
    }

    /// Copy of the current settings, for use across an upstream call.
    pub fn snapshot(&self) -> AiSettings {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply a patch.
    ///
    /// A patch without `ai_api_key` falls back to the default key when one is
    /// configured, so the form can omit the masked key field.
    pub fn update(&self, patch: SettingsPatch) -> AiSettings {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(url) = patch.ai_service_url {
            guard.service_url = normalize_api_url(&url);
        }
        match patch.ai_api_key {
            Some(key) => guard.api_key = key,
            None if !self.defaults.api_key.trim().is_empty() => {
                guard.api_key = self.defaults.api_key.clone();
            }
            None => {}
        }
        if let Some(model) = patch.ai_model {
            guard.model = model;
        }

        tracing::info!(
            url = %guard.service_url,
            model = %guard.model,
            has_key = !guard.api_key.is_empty(),
            "settings updated"
        );
        guard.clone()
    }

    pub fn defaults(&self) -> SettingsDefaults {
        SettingsDefaults {
            ai_service_url: self.defaults.service_url.clone(),
            ai_model: self.defaults.model.clone(),
            has_api_key: !self.defaults.api_key.trim().is_empty(),
        }
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(AiSettings::from(&AiConfig::default()))
    }
}
