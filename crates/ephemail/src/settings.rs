//! Persisted application settings.

use std::path::PathBuf;

use ephemail_core::ViewerConfig;
use serde::{Deserialize, Serialize};

/// Default REST endpoint of the disposable mail service.
pub const DEFAULT_API_BASE: &str = "https://api.mail.tm";

/// Application settings that persist across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Base URL of the mail API.
    pub api_base: String,
    /// Bearer token of the temporary inbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Viewer timings.
    pub viewer: ViewerConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            viewer: ViewerConfig::default(),
        }
    }
}

/// Location of the settings file.
pub fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ephemail")
        .join("settings.json")
}

/// Load application settings from file.
pub async fn load_settings() -> Result<AppSettings, String> {
    let settings_path = settings_path();

    if !settings_path.exists() {
        return Ok(AppSettings::default());
    }

    let contents = tokio::fs::read_to_string(&settings_path)
        .await
        .map_err(|e| e.to_string())?;

    parse_settings(&contents)
}

fn parse_settings(contents: &str) -> Result<AppSettings, String> {
    let settings: AppSettings = serde_json::from_str(contents).map_err(|e| e.to_string())?;
    settings.viewer.validate().map_err(|e| e.to_string())?;
    Ok(settings)
}
