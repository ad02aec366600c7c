//! Configuration service implementation.
//!
//! Loads [`CastingConfig`] from a TOML file and caches it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use sts_core::config::CastingConfig;
use sts_core::{CastingError, Result};

use crate::paths::StsPaths;

/// Configuration service that loads and caches the casting configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<CastingConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses `config.toml` in the platform config directory.
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(StsPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// An unreadable or invalid file yields the defaults.
    pub fn get_config(&self) -> CastingConfig {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return cached.clone();
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!("[ConfigService] {}; using defaults", e);
            CastingConfig::default()
        });

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Reads the file without touching the cache. A missing file is not an error.
    pub fn load(&self) -> Result<CastingConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigService] No config at {}, using defaults",
                self.path.display()
            );
            return Ok(CastingConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            CastingError::io(format!(
                "Failed to read config '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            CastingError::config(format!(
                "Failed to parse config '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}
