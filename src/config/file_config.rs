//! Configuration file support for cite-master.
//!
//! # Configuration File Format
//!
//! ```toml
//! [extract]
//! marker = "參考文獻"
//!
//! [format]
//! style = "apa"        # apa | tjs | chicago
//! markup = false
//! with_doi = false
//!
//! [matcher]
//! suggestion_threshold = 0.85
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Config, ExtractConfig, FormatConfig, LoggingConfig, MatcherConfig};

/// Configuration file structure
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub format: FormatConfig,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Create default configuration
    pub fn create_default() -> Self {
        Self::from(Config::default())
    }
}

impl From<Config> for ConfigFile {
    fn from(config: Config) -> Self {
        Self {
            extract: config.extract,
            format: config.format,
            matcher: config.matcher,
            logging: config.logging,
        }
    }
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            extract: file.extract,
            format: file.format,
            matcher: file.matcher,
            logging: file.logging,
        }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cite::Style;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[extract]
marker = "References"

[format]
style = "chicago"
with_doi = true

[matcher]
suggestion_threshold = 0.9

[logging]
level = "debug"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert_eq!(config.extract.marker, "References");
        assert_eq!(config.format.style, Style::Chicago);
        assert!(config.format.with_doi);
        assert!(!config.format.markup);
        assert_eq!(config.matcher.suggestion_threshold, 0.9);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ConfigFile::create_default();
        config.format.style = Style::Tjs;
        config.extract.marker = "Bibliography".to_string();

        config.save(&path).unwrap();

        let loaded: Config = ConfigFile::load(&path).unwrap().into();
        assert_eq!(loaded.format.style, Style::Tjs);
        assert_eq!(loaded.extract.marker, "Bibliography");
        assert_eq!(loaded.matcher, MatcherConfig::default());
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/config.toml");
        let result = ConfigFile::load(&path);
        assert!(matches!(result, Err(ConfigFileError::Io(_))));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        let result = ConfigFile::load(&path);
        assert!(matches!(result, Err(ConfigFileError::Parse(_))));
    }
}
