//! Persistence of the casting state through a key-value medium.
//!
//! Saves write the [`PersistedState`] projection of [`CastingState`] under a
//! single namespaced key. Loads never fail: unreadable or undecodable data
//! yields an empty state, and every load is followed by a retention prune.

use std::collections::HashMap;
use std::sync::Arc;

use sts_core::clock::{Clock, system_clock};
use sts_core::config::CastingConfig;
use sts_core::session::Session;
use sts_core::state::{CastingState, KeyValueStorage, PersistedState};
use sts_core::Result;

use crate::codec::StateCodec;

/// Bounds applied to the session set at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_sessions: usize,
    pub max_age_ms: i64,
}

impl RetentionPolicy {
    pub fn from_config(config: &CastingConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
            max_age_ms: config.max_session_age_ms(),
        }
    }

    /// Drops sessions older than the age window, then keeps only the
    /// `max_sessions` most recently updated.
    ///
    /// Returns the ids that were removed.
    pub fn prune(&self, sessions: &mut HashMap<String, Session>, now_ms: i64) -> Vec<String> {
        let mut removed: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| now_ms.saturating_sub(session.last_updated) > self.max_age_ms)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &removed {
            sessions.remove(id);
        }

        if sessions.len() > self.max_sessions {
            let mut by_recency: Vec<(&String, i64)> = sessions
                .iter()
                .map(|(id, session)| (id, session.last_updated))
                .collect();
            // Newest first; id breaks ties so the outcome is deterministic.
            by_recency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

            let overflow: Vec<String> = by_recency
                .into_iter()
                .skip(self.max_sessions)
                .map(|(id, _)| id.clone())
                .collect();
            for id in &overflow {
                sessions.remove(id);
            }
            removed.extend(overflow);
        }

        removed
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&CastingConfig::default())
    }
}

/// Reads and writes the casting state through [`KeyValueStorage`].
pub struct PersistenceLayer {
    storage: Arc<dyn KeyValueStorage>,
    codec: StateCodec,
    key: String,
    retention: RetentionPolicy,
    clock: Clock,
}

impl PersistenceLayer {
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &CastingConfig) -> Result<Self> {
        Ok(Self {
            storage,
            codec: StateCodec::new()?,
            key: config.storage_key.clone(),
            retention: RetentionPolicy::from_config(config),
            clock: system_clock(),
        })
    }

    /// Replaces the clock used to judge session age.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Writes the persistable projection of `state`.
    pub async fn save(&self, state: &CastingState) -> Result<()> {
        self.save_persisted(&PersistedState::from(state)).await
    }

    pub async fn save_persisted(&self, persisted: &PersistedState) -> Result<()> {
        let encoded = self.codec.encode(persisted)?;
        self.storage.set(&self.key, encoded).await?;
        tracing::debug!(
            "[PersistenceLayer] Saved {} session(s) under '{}'",
            persisted.sessions.len(),
            self.key
        );
        Ok(())
    }

    /// Loads and prunes the stored state.
    ///
    /// Missing, unreadable or corrupt data is logged and yields defaults.
    pub async fn load(&self) -> PersistedState {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("[PersistenceLayer] Nothing stored under '{}'", self.key);
                return PersistedState::default();
            }
            Err(e) => {
                tracing::warn!(
                    "[PersistenceLayer] Failed to read '{}', starting fresh: {}",
                    self.key,
                    e
                );
                return PersistedState::default();
            }
        };

        match self.codec.decode(&raw) {
            Ok(persisted) => self.prune(persisted),
            Err(e) => {
                tracing::warn!(
                    "[PersistenceLayer] Discarding undecodable state under '{}': {}",
                    self.key,
                    e
                );
                PersistedState::default()
            }
        }
    }

    /// Applies the retention policy and clears a pointer to a pruned session.
    pub fn prune(&self, mut persisted: PersistedState) -> PersistedState {
        let removed = self
            .retention
            .prune(&mut persisted.sessions, (self.clock)());
        if !removed.is_empty() {
            tracing::info!(
                "[PersistenceLayer] Pruned {} session(s): {:?}",
                removed.len(),
                removed
            );
        }

        let active_missing = persisted
            .active_session_id
            .as_ref()
            .is_some_and(|id| !persisted.sessions.contains_key(id));
        if active_missing {
            tracing::debug!("[PersistenceLayer] Active session was pruned, clearing pointer");
            persisted.active_session_id = None;
        }
        persisted
    }
}
