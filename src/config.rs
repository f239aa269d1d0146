//! Application Configuration
//! Defaults, optional TOML file, then environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "realty_search.toml";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings for the Gemini special-requirements parser.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GEMINI_DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding one CSV of listings per city.
    pub data_dir: PathBuf,
    pub gemini: GeminiConfig,
    /// Parse special requirements locally when no API key is available.
    pub local_fallback: bool,
    /// Result rows per page.
    pub page_size: usize,
    pub cjk_font: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./Data"),
            gemini: GeminiConfig::default(),
            local_fallback: true,
            page_size: 10,
            cjk_font: None,
        }
    }
}

impl AppConfig {
    /// Load from `REALTY_SEARCH_CONFIG` (must exist) or `realty_search.toml`
    /// (optional), then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os("REALTY_SEARCH_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(s)?;
        config.page_size = config.page_size.max(1);
        Ok(config)
    }

    /// Apply `GEMINI_API_KEY` / `GOOGLE_API_KEY` and `REALTY_DATA_DIR`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup("GOOGLE_API_KEY").filter(|k| !k.trim().is_empty()));
        if let Some(key) = key {
            self.gemini.api_key = Some(key);
        }
        if let Some(dir) = lookup("REALTY_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }
}
