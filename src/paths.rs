//! XDG directory resolution for archivum.
//!
//! `ArchivumPaths` resolves the config and data directories following the
//! XDG Base Directory Specification.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

const APP_DIR: &str = "archivum";

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(archivum::paths::no_home),
        help("Set the HOME environment variable, or pass --data-dir and --config explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(archivum::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Directories archivum reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivumPaths {
    /// `$XDG_CONFIG_HOME/archivum/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/archivum/`
    pub data_dir: PathBuf,
}

impl ArchivumPaths {
    /// Resolve directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    fn from_env(var: impl Fn(&str) -> Option<String>) -> PathResult<Self> {
        let home = var("HOME").map(PathBuf::from);
        let base = |xdg: &str, fallback: &str| -> PathResult<PathBuf> {
            match var(xdg).filter(|v| !v.is_empty()) {
                Some(dir) => Ok(PathBuf::from(dir)),
                None => home
                    .as_ref()
                    .map(|h| h.join(fallback))
                    .ok_or(PathError::NoHome),
            }
        };

        Ok(Self {
            config_dir: base("XDG_CONFIG_HOME", ".config")?.join(APP_DIR),
            data_dir: base("XDG_DATA_HOME", ".local/share")?.join(APP_DIR),
        })
    }

    /// Create both directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("archivum.toml")
    }

    /// Default location of the redb database directory.
    pub fn default_data_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }
}
