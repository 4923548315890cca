//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rsdom/rsdom.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `RSDOM_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// How the CLI prints a rendered document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Serialized markup
    #[default]
    Html,
    /// Indented node tree
    Tree,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "tree" => Ok(OutputFormat::Tree),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Rendering of the final document
    pub format: OutputFormat,
    /// Colored status lines
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Html,
            color: true,
        }
    }
}

/// Raw output config for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputConfig {
    pub format: Option<OutputFormat>,
    pub color: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_selector: Option<String>,
    pub max_turns: Option<usize>,
    #[serde(default)]
    pub output: RawOutputConfig,
}

/// Unified configuration for rsdom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Selector of the element the app mounts into (default: `#app`)
    pub root_selector: String,
    /// Upper bound of task-queue turns the CLI drains after each event
    pub max_turns: usize,
    /// Output settings
    pub output: OutputConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_selector: "#app".into(),
            max_turns: 16,
            output: OutputConfig::default(),
        }
    }
}

/// Get the XDG config directory for rsdom.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rsdom").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rsdom.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_selector: overlay
                .root_selector
                .clone()
                .unwrap_or_else(|| self.root_selector.clone()),
            max_turns: overlay.max_turns.unwrap_or(self.max_turns),
            output: OutputConfig {
                format: overlay.output.format.unwrap_or(self.output.format),
                color: overlay.output.color.unwrap_or(self.output.color),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist if given
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/rsdom/rsdom.toml`
    /// 3. Explicit config file
    /// 4. Environment variables: `RSDOM_*` prefix, `__` as section separator
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        Self::apply_env_overrides(current)
    }

    /// Apply RSDOM_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RSDOM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("root_selector") {
            settings.root_selector = val;
        }
        if let Ok(val) = config.get_string("max_turns") {
            settings.max_turns = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("RSDOM_MAX_TURNS: {}", e),
            })?;
        }
        if let Ok(val) = config.get_string("output.format") {
            settings.output.format = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("output.color") {
            settings.output.color = val;
        }

        Ok(settings)
    }

    /// Settings as TOML, for `rsdom config`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
