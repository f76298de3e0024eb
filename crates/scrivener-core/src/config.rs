//! Scrivener configuration.
//!
//! Stored as TOML at `<config dir>/scrivener/config.toml`. Every struct
//! is `#[serde(default)]`, so a partial file only overrides what it names.
//!
//! ```toml
//! [render]
//! cursor_marker = "|"
//! line_number_width = 4
//!
//! [assist]
//! command = "llm-bridge"
//! args = ["--model", "small"]
//! timeout_secs = 60
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Context rendering settings
    pub render: RenderConfig,

    /// Assistant settings
    pub assist: AssistConfig,

    /// Session settings
    pub session: SessionConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Using default config: {}", err);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("scrivener").join("config.toml"))
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// How the editor context is rendered for the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Glyph inserted into the current line at the caret
    pub cursor_marker: String,

    /// Width line numbers are right-aligned to
    pub line_number_width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cursor_marker: "|".to_string(),
            line_number_width: 4,
        }
    }
}

/// External assistant settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Program that answers requests (JSON on stdin, JSON on stdout)
    pub command: Option<String>,

    /// Arguments passed to `command`
    pub args: Vec<String>,

    /// Seconds to wait for a reply
    pub timeout_secs: u64,

    /// Replaces the built-in system prompt
    pub system_prompt: Option<String>,

    /// Drop Markdown code fence lines from replies
    pub strip_code_fences: bool,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 60,
            system_prompt: None,
            strip_code_fences: true,
        }
    }
}

/// Session bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Entries kept in the activity log
    pub log_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { log_capacity: 500 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
