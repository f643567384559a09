//! Configuration management.
//!
//! Settings come from a TOML file (see [`find_config_file`]) overlaid with
//! `CITE_MASTER_*` environment variables, e.g. `CITE_MASTER_FORMAT__STYLE=tjs`.

mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cite::{FormatOptions, RenderMode, Style};
use crate::keys::DEFAULT_MARKER;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CITE_MASTER";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "cite-master.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub format: FormatConfig,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Key extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Heading that starts the bibliography; text from here on is not mined
    #[serde(default = "default_marker")]
    pub marker: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

/// Citation rendering settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default)]
    pub style: Style,

    /// Emit inline HTML for emphasis and links
    #[serde(default)]
    pub markup: bool,

    #[serde(default)]
    pub with_doi: bool,
}

impl FormatConfig {
    pub fn options(&self) -> FormatOptions {
        let mode = if self.markup {
            RenderMode::Markup
        } else {
            RenderMode::Plain
        };
        FormatOptions::new(self.style)
            .with_mode(mode)
            .with_doi(self.with_doi)
    }
}

/// Key matching settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Minimum Jaro-Winkler similarity for a near-miss suggestion
    #[serde(default = "default_threshold")]
    pub suggestion_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            suggestion_threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    0.85
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for JSON log lines
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `./cite-master.toml`, else `<config dir>/cite-master/config.toml`, if
/// either exists.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|p| p.is_file())
}

/// Per-user config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cite-master").join("config.toml"))
}

/// Load configuration from `path`, or from the discovered file, overlaid
/// with environment variables.
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(file) = path.map(Path::to_path_buf).or_else(find_config_file) {
        tracing::debug!("Loading configuration from {}", file.display());
        builder = builder.add_source(config::File::from(file.as_path()));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
