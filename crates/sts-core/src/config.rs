use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::state::DEFAULT_RECENT_PROJECTS_LIMIT;

/// Runtime configuration for the casting store, read from `config.toml`.
///
/// Every field has a default so a partial (or missing) file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CastingConfig {
    /// Namespaced key the whole persisted state is stored under.
    pub storage_key: String,
    /// Upper bound on sessions surviving a load-time prune.
    pub max_sessions: usize,
    /// Sessions not updated within this window are pruned at load.
    pub max_session_age_hours: u64,
    pub recent_projects_limit: usize,
    pub autosave_interval_secs: u64,
    /// Directory for rolling log files. Stdout only when unset.
    pub log_dir: Option<PathBuf>,
}

impl CastingConfig {
    pub const DEFAULT_STORAGE_KEY: &'static str = "sts-casting-state";
    pub const DEFAULT_MAX_SESSIONS: usize = 10;
    pub const DEFAULT_MAX_SESSION_AGE_HOURS: u64 = 12;

    /// Maximum session age in milliseconds.
    pub fn max_session_age_ms(&self) -> i64 {
        let hours = i64::try_from(self.max_session_age_hours).unwrap_or(i64::MAX / 3_600_000);
        hours.saturating_mul(3_600_000)
    }
}

impl Default for CastingConfig {
    fn default() -> Self {
        Self {
            storage_key: Self::DEFAULT_STORAGE_KEY.to_string(),
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            max_session_age_hours: Self::DEFAULT_MAX_SESSION_AGE_HOURS,
            recent_projects_limit: DEFAULT_RECENT_PROJECTS_LIMIT,
            autosave_interval_secs: 5,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CastingConfig = toml::from_str("max_sessions = 3\n").unwrap();
        assert_eq!(config.max_sessions, 3);
        assert_eq!(config.max_session_age_hours, 12);
        assert_eq!(config.storage_key, "sts-casting-state");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_max_age_ms() {
        let config = CastingConfig::default();
        assert_eq!(config.max_session_age_ms(), 12 * 60 * 60 * 1000);
    }
}
