//! Path management for the casting store's files.
//!
//! Directories are resolved via AppPaths from the version-migrate crate.
//!
//! ```text
//! ~/.config/sts-casting/       # Config directory
//! ├── config.toml              # CastingConfig
//! └── logs/                    # Rolling logs
//!     └── sts-casting.log.YYYY-MM-DD
//!
//! ~/.local/share/sts-casting/  # Data directory
//! └── state/                   # Key-value storage
//!     └── sts-casting-state.json
//! ```

use std::path::PathBuf;
use version_migrate::AppPaths;

use sts_core::CastingError;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for CastingError {
    fn from(e: PathError) -> Self {
        CastingError::config(e.to_string())
    }
}

pub struct StsPaths;

impl StsPaths {
    const APP_NAME: &'static str = "sts-casting";

    fn app_paths() -> AppPaths {
        AppPaths::new(Self::APP_NAME)
    }

    pub fn config_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    pub fn data_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .data_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    /// Path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory holding the key-value storage files.
    pub fn state_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("state"))
    }
}
