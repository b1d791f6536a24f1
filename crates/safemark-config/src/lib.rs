//! Configuration management for safemark.
//!
//! Parses `safemark.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [render]
//! allow_html = false
//! linkify = true
//! link_target_blank = true
//!
//! [engine]
//! fallback = false
//! max_lines = 100000
//! ```

use safemark_renderer::{Converter, RenderOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override raw HTML passthrough.
    pub allow_html: Option<bool>,
    /// Override link scheme validation.
    pub allow_unsafe_links: Option<bool>,
    /// Override bare URL auto-linking.
    pub linkify: Option<bool>,
    /// Override smart punctuation.
    pub typographer: Option<bool>,
    /// Override soft line breaks as `<br />`.
    pub breaks: Option<bool>,
    /// Override `target="_blank"` on links.
    pub link_target_blank: Option<bool>,
    /// Force the built-in engine.
    pub fallback: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "safemark.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rendering options passed to the converter.
    pub render: RenderOptions,
    /// Engine selection and input limits.
    pub engine: EngineConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Engine configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Use the built-in engine even when a delegated engine is compiled in.
    pub fallback: bool,
    /// Reject documents with more lines than this.
    pub max_lines: Option<usize>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `safemark.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let render = &mut self.render;
        let overrides = [
            (&mut render.allow_html, settings.allow_html),
            (&mut render.allow_unsafe_links, settings.allow_unsafe_links),
            (&mut render.linkify, settings.linkify),
            (&mut render.typographer, settings.typographer),
            (&mut render.breaks, settings.breaks),
            (&mut render.link_target_blank, settings.link_target_blank),
            (&mut self.engine.fallback, settings.fallback),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
    }

    /// Build the converter selected by `[engine]`.
    #[must_use]
    pub fn converter(&self) -> Converter {
        if self.engine.fallback {
            Converter::fallback_only()
        } else {
            Converter::new()
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_lines == Some(0) {
            return Err(ConfigError::Validation(
                "engine.max_lines must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}
