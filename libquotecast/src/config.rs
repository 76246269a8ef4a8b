//! Configuration management for Quotecast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub facebook: FacebookConfig,
    pub generation: GenerationConfig,
    pub image_host: ImageHostConfig,
    pub compose: ComposeConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/quotecast/quotecast.db".to_string(),
        }
    }
}

/// Graph API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacebookConfig {
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.facebook.com/v21.0".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub default_resolution: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            default_model: "gemini-2.0-flash-exp".to_string(),
            default_resolution: "2K".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageHostConfig {
    pub upload_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            upload_url: "https://freeimage.host/api/1/upload".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Templated-background image service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub render_url: String,
    pub upload_url: String,
    pub default_font: String,
    pub timeout_secs: u64,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            render_url: "https://og-image.lslly.com/api/og".to_string(),
            upload_url: "https://litterbox.catbox.moe/resources/internals/api.php".to_string(),
            default_font: "noto-sans-thai".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Share items younger than this wait for the next matching minute
    pub min_share_age_secs: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_share_age_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply `QUOTECAST_DB_PATH`, `GEMINI_API_KEY` and `FREEIMAGE_API_KEY`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("QUOTECAST_DB_PATH") {
            self.database.path = path;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                self.generation.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("FREEIMAGE_API_KEY") {
            if !key.is_empty() {
                self.image_host.api_key = Some(key);
            }
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("QUOTECAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("quotecast").join("config.toml"))
}
