//! Application state domain models.
//!
//! Contains the in-memory casting state and the projection of it that
//! persists across restarts.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::session::{Session, voice_cache_key};

/// Default cap on the recent-projects list.
pub const DEFAULT_RECENT_PROJECTS_LIMIT: usize = 10;

/// User preferences that persist across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Recently opened screenplay projects, most recent first.
    #[serde(default)]
    pub recent_projects: Vec<String>,
    /// Starred voices as `provider:voice_id` keys.
    #[serde(default)]
    pub starred_voices: HashSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<String>,
}

impl Preferences {
    /// Records `path` as the most recent project.
    ///
    /// An existing entry moves to the front instead of being duplicated; the
    /// list is truncated to `limit` entries.
    pub fn add_recent_project(&mut self, path: impl Into<String>, limit: usize) {
        let path = path.into();
        self.recent_projects.retain(|existing| existing != &path);
        self.recent_projects.insert(0, path);
        self.recent_projects.truncate(limit);
    }

    /// Stars or un-stars a voice. Returns whether the voice is now starred.
    pub fn toggle_starred_voice(&mut self, provider: &str, voice_id: &str) -> bool {
        let key = voice_cache_key(provider, voice_id);
        if self.starred_voices.remove(&key) {
            false
        } else {
            self.starred_voices.insert(key);
            true
        }
    }

    pub fn is_starred(&self, provider: &str, voice_id: &str) -> bool {
        self.starred_voices
            .contains(&voice_cache_key(provider, voice_id))
    }
}

/// Ephemeral UI state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Free text being typed in the active form
    pub text_input: String,
    /// Last transient error shown to the user
    pub last_error: Option<String>,
    /// Window size in logical pixels
    pub viewport: Option<(u32, u32)>,
    /// Identifier of the open modal, if any
    pub open_modal: Option<String>,
}

/// The complete in-memory casting state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CastingState {
    pub preferences: Preferences,
    pub sessions: HashMap<String, Session>,
    /// Must reference a session in `sessions` or be `None`.
    pub active_session_id: Option<String>,
    pub ui: UiState,
}

impl CastingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active session, or `None` if the pointer is unset or stale.
    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id
            .as_ref()
            .and_then(|id| self.sessions.get(id))
    }

    /// Rebuilds in-memory state from its persisted projection.
    ///
    /// A dangling active pointer is cleared.
    pub fn from_persisted(persisted: PersistedState) -> Self {
        let mut state = Self {
            preferences: persisted.preferences,
            sessions: persisted.sessions,
            active_session_id: persisted.active_session_id,
            ui: UiState::default(),
        };
        if state.active_session().is_none() {
            state.active_session_id = None;
        }
        state
    }
}

/// The subset of [`CastingState`] that survives a restart.
///
/// UI-only fields (text entry, transient errors, viewport, modal state) are
/// deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub sessions: HashMap<String, Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<String>,
}

impl From<&CastingState> for PersistedState {
    fn from(state: &CastingState) -> Self {
        Self {
            preferences: state.preferences.clone(),
            sessions: state.sessions.clone(),
            active_session_id: state.active_session_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_projects_lru_cap() {
        let mut prefs = Preferences::default();
        for i in 0..12 {
            prefs.add_recent_project(format!("/projects/{i}"), DEFAULT_RECENT_PROJECTS_LIMIT);
        }

        assert_eq!(prefs.recent_projects.len(), 10);
        assert_eq!(prefs.recent_projects[0], "/projects/11");
        assert_eq!(prefs.recent_projects[9], "/projects/2");
        assert!(!prefs.recent_projects.contains(&"/projects/0".to_string()));
        assert!(!prefs.recent_projects.contains(&"/projects/1".to_string()));
    }

    #[test]
    fn test_recent_projects_readd_moves_to_front() {
        let mut prefs = Preferences::default();
        prefs.add_recent_project("/a", 10);
        prefs.add_recent_project("/b", 10);
        prefs.add_recent_project("/c", 10);
        prefs.add_recent_project("/a", 10);

        assert_eq!(prefs.recent_projects, vec!["/a", "/c", "/b"]);
    }

    #[test]
    fn test_toggle_starred_voice() {
        let mut prefs = Preferences::default();
        assert!(prefs.toggle_starred_voice("openai", "alloy"));
        assert!(prefs.is_starred("openai", "alloy"));
        assert!(!prefs.toggle_starred_voice("openai", "alloy"));
        assert!(prefs.starred_voices.is_empty());
    }

    #[test]
    fn test_projection_drops_ui_state() {
        let mut state = CastingState::new();
        state.ui.text_input = "draft".into();
        state.ui.last_error = Some("boom".into());
        state
            .sessions
            .insert("s-1".into(), Session::new("s-1", 0));
        state.active_session_id = Some("s-1".into());

        let persisted = PersistedState::from(&state);
        let restored = CastingState::from_persisted(persisted);

        assert_eq!(restored.ui, UiState::default());
        assert_eq!(restored.active_session_id.as_deref(), Some("s-1"));
    }

    #[test]
    fn test_from_persisted_clears_dangling_pointer() {
        let persisted = PersistedState {
            active_session_id: Some("gone".into()),
            ..PersistedState::default()
        };
        let state = CastingState::from_persisted(persisted);
        assert!(state.active_session_id.is_none());
    }
}
