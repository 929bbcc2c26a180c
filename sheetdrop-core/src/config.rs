//! Configuration management
//!
//! Settings live in `settings.json` inside the sheetdrop directory:
//! ```json
//! {
//!   "app": { "backend": "remote" },
//!   "api": { "baseUrl": "https://api.sheetdrop.io", "token": "..." }
//! }
//! ```
//! Keys this crate does not manage are kept when saving.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;

/// Default SheetDrop API location
pub const DEFAULT_API_URL: &str = "https://api.sheetdrop.io";

pub const BACKEND_ENV: &str = "SHEETDROP_BACKEND";
pub const API_URL_ENV: &str = "SHEETDROP_API_URL";
pub const API_TOKEN_ENV: &str = "SHEETDROP_API_TOKEN";
pub const DIR_ENV: &str = "SHEETDROP_DIR";

/// Where rules are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// DuckDB file in the sheetdrop directory, for offline use
    Local,
    /// SheetDrop REST API
    #[default]
    Remote,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Local => "local",
            Backend::Remote => "remote",
        })
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "remote" => Ok(Backend::Remote),
            other => Err(Error::Config(format!(
                "Unknown backend '{}' (expected 'local' or 'remote')",
                other
            ))),
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    api: ApiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend: Option<Backend>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// SheetDrop configuration (resolved view of settings and environment)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub api_base_url: String,
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Remote,
            api_base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
        }
    }
}

/// Resolve the sheetdrop directory: `SHEETDROP_DIR`, else `~/.sheetdrop`
pub fn sheetdrop_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".sheetdrop"))
        .ok_or_else(|| Error::Config("Cannot determine home directory".to_string()).into())
}

fn read_settings(settings_path: &Path) -> Result<SettingsFile> {
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

impl Config {
    /// Load config from the sheetdrop directory, applying environment overrides
    pub fn load(sheetdrop_dir: &Path) -> Result<Self> {
        Self::load_with_env(sheetdrop_dir, |key| std::env::var(key).ok())
    }

    /// Load config using `env` to look up overrides
    pub fn load_with_env(
        sheetdrop_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw = read_settings(&sheetdrop_dir.join("settings.json"))?;
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let backend = match env(BACKEND_ENV) {
            Some(value) => value.parse()?,
            None => raw.app.backend.unwrap_or_default(),
        };

        let api_base_url = env(API_URL_ENV)
            .or(raw.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_token = env(API_TOKEN_ENV).or(raw.api.token);

        Ok(Self {
            backend,
            api_base_url,
            api_token,
        })
    }

    /// Save config to the sheetdrop directory
    ///
    /// Preserves other settings that this crate doesn't manage.
    pub fn save(&self, sheetdrop_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(sheetdrop_dir)?;
        let settings_path = sheetdrop_dir.join("settings.json");
        let mut settings = read_settings(&settings_path)?;

        settings.app.backend = Some(self.backend);
        settings.api.base_url = Some(self.api_base_url.clone());
        settings.api.token = self.api_token.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}
