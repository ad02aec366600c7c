pub mod recent;
pub mod sessions;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use sts_application::CastingApp;
use sts_core::config::CastingConfig;
use sts_infrastructure::{ConfigService, FileKeyValueStorage, InMemoryCastingBackend, StsPaths};

/// Resolved config and storage location shared by every command.
pub struct Context {
    pub config: CastingConfig,
    pub data_dir: PathBuf,
}

impl Context {
    pub fn resolve(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let service = match config_path {
            Some(path) => ConfigService::new(path),
            None => ConfigService::at_default_location()?,
        };
        let config = service.load()?;
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => StsPaths::state_dir()?,
        };
        Ok(Self { config, data_dir })
    }

    /// Opens the stored state. Loading applies the retention policy.
    pub async fn open(&self) -> Result<CastingApp> {
        let storage = Arc::new(FileKeyValueStorage::new(&self.data_dir));
        // Maintenance commands never commit, so no remote backend is needed.
        let backend = Arc::new(InMemoryCastingBackend::new());
        Ok(CastingApp::open(self.config.clone(), storage, backend).await?)
    }
}
