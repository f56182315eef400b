//! Engine configuration and its TOML file form.
//!
//! Every component receives its settings through [`EngineConfig`] at
//! construction; there is no process-wide mutable configuration.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EngineError;

/// Errors from loading or saving configuration files.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    #[diagnostic(
        code(archivum::config::read),
        help("Check that the file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}")]
    #[diagnostic(
        code(archivum::config::write),
        help("Check that the config directory is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    #[diagnostic(
        code(archivum::config::parse),
        help("The file must be valid TOML matching the documented keys.")
    )]
    Parse { path: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Word filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Tokens shorter than this (in characters) are noise.
    pub min_word_len: usize,
    /// Short tokens indexed regardless of `min_word_len`.
    pub keep_words: Vec<String>,
    /// Added to the built-in stop-word list.
    pub extra_stop_words: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_word_len: 3,
            keep_words: ["ai", "ar", "os", "ui", "ux", "vr", "3d"]
                .into_iter()
                .map(String::from)
                .collect(),
            extra_stop_words: Vec::new(),
        }
    }
}

/// Configuration for the archivum engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    pub data_dir: Option<PathBuf>,
    /// Distance between neighbouring positions after a renumbering.
    pub position_step: i64,
    /// Delete index words once no content references them.
    pub collect_orphan_words: bool,
    pub filter: FilterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            position_step: 10,
            collect_orphan_words: true,
            filter: FilterConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject settings the engines cannot work with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.position_step < 2 {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "position_step must be at least 2 to leave room between items, got {}",
                    self.position_step
                ),
            });
        }
        if self.filter.min_word_len == 0 {
            return Err(EngineError::InvalidConfig {
                message: "filter.min_word_len must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn tiny_step_rejected() {
        let config = EngineConfig {
            position_step: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            position_step = 100

            [filter]
            extra_stop_words = ["misc"]
            "#,
        )
        .unwrap();
        assert_eq!(config.position_step, 100);
        assert!(config.collect_orphan_words);
        assert_eq!(config.filter.min_word_len, 3);
        assert_eq!(config.filter.extra_stop_words, vec!["misc".to_string()]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("archivum.toml");
        let config = EngineConfig {
            data_dir: Some(dir.path().join("data")),
            position_step: 16,
            collect_orphan_words: false,
            filter: FilterConfig::default(),
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
