use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sts_core::clock::{Clock, system_clock};
use sts_core::screenplay::ScreenplayCharacters;
use sts_core::session::{CastingMethod, Session, SessionPatch, SessionStats, StoreEvent};
use sts_core::state::{
    CastingState, DEFAULT_RECENT_PROJECTS_LIMIT, PersistedState, Preferences, UiState,
};
use sts_core::{CastingError, Result};

/// Callback invoked for every published [`StoreEvent`].
pub type StoreListener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone, Copy)]
enum Target<'a> {
    Active,
    Session(&'a str),
}

/// Owns the session collection and the active-session pointer.
///
/// Every mutation runs under one write lock, so mutations never interleave.
/// Listeners are notified after the lock is released.
pub struct SessionStore {
    state: RwLock<CastingState>,
    listeners: RwLock<HashMap<SubscriptionId, StoreListener>>,
    next_subscription: AtomicU64,
    revision: AtomicU64,
    clock: Clock,
    recent_projects_limit: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CastingState::new()),
            listeners: RwLock::new(HashMap::new()),
            next_subscription: AtomicU64::new(0),
            revision: AtomicU64::new(0),
            clock: system_clock(),
            recent_projects_limit: DEFAULT_RECENT_PROJECTS_LIMIT,
        }
    }

    /// Replaces the clock used to stamp `last_updated`.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_recent_projects_limit(mut self, limit: usize) -> Self {
        self.recent_projects_limit = limit;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, CastingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CastingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    // ============================================================================
    // Subscription
    // ============================================================================

    pub fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        id
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Monotonic counter of persisted-state changes.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Bumps the revision and notifies listeners. Must be called without the
    /// state lock held.
    fn publish(&self, events: Vec<StoreEvent>) {
        if events.is_empty() {
            return;
        }
        self.revision.fetch_add(1, Ordering::AcqRel);

        let listeners: Vec<StoreListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for event in &events {
            for listener in &listeners {
                listener(event);
            }
        }
    }

    // ============================================================================
    // Persistence hand-off
    // ============================================================================

    /// Replaces the whole state with a loaded projection. UI state resets.
    ///
    /// Does not advance the revision: the primed state is already durable.
    pub fn prime(&self, persisted: PersistedState) {
        let session_count = persisted.sessions.len();
        *self.write() = CastingState::from_persisted(persisted);
        tracing::debug!("[SessionStore] Primed with {} session(s)", session_count);

        let listeners: Vec<StoreListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in &listeners {
            listener(&StoreEvent::StateReplaced);
        }
    }

    /// The persistable projection of the current state.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState::from(&*self.read())
    }

    /// A full copy of the current state, UI fields included.
    pub fn state(&self) -> CastingState {
        self.read().clone()
    }

    // ============================================================================
    // Session lifecycle
    // ============================================================================

    /// Activates session `id`, creating it from `patch` if it does not exist.
    ///
    /// An existing session is merged with `patch` field by field; assignments
    /// are only replaced when the patch carries them. Never fails.
    pub fn select_or_create_session(&self, id: &str, patch: Option<SessionPatch>) -> Session {
        let now = self.now();
        let (session, created) = {
            let mut state = self.write();
            let created = !state.sessions.contains_key(id);
            let session = state
                .sessions
                .entry(id.to_string())
                .or_insert_with(|| Session::new(id, now));
            if let Some(patch) = patch {
                session.apply_patch(patch);
            }
            session.last_updated = now;
            let session = session.clone();
            state.active_session_id = Some(id.to_string());
            (session, created)
        };

        tracing::debug!(
            "[SessionStore] Selected session {} (created: {})",
            id,
            created
        );
        self.publish(vec![StoreEvent::SessionSelected {
            session_id: id.to_string(),
            created,
        }]);
        session
    }

    /// Removes session `id`, clearing the active pointer if it pointed there.
    ///
    /// Returns whether a session was removed; unknown ids are a no-op.
    pub fn delete_session(&self, id: &str) -> bool {
        let mut events = Vec::new();
        {
            let mut state = self.write();
            if state.sessions.remove(id).is_none() {
                return false;
            }
            events.push(StoreEvent::SessionDeleted {
                session_id: id.to_string(),
            });
            if state.active_session_id.as_deref() == Some(id) {
                state.active_session_id = None;
                events.push(StoreEvent::ActiveSessionCleared);
            }
        }

        tracing::debug!("[SessionStore] Deleted session {}", id);
        self.publish(events);
        true
    }

    /// The active session, or `None` when the pointer is unset or stale.
    pub fn get_active_session(&self) -> Option<Session> {
        self.read().active_session().cloned()
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.read().active_session_id.clone()
    }

    pub fn session(&self, id: &str) -> Option<Session> {
        self.read().sessions.get(id).cloned()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.read().sessions.values().cloned().collect()
    }

    /// Casting progress for session `id`, or `None` if it does not exist.
    pub fn get_session_stats(
        &self,
        id: &str,
        characters: Option<&ScreenplayCharacters>,
    ) -> Option<SessionStats> {
        self.read()
            .sessions
            .get(id)
            .map(|session| SessionStats::compute(session, characters))
    }

    /// Up to `limit` sessions, most recently updated first.
    pub fn get_recent_sessions(&self, limit: usize) -> Vec<Session> {
        let mut sessions = self.sessions();
        sessions.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        sessions.truncate(limit);
        sessions
    }

    // ============================================================================
    // Session mutation
    // ============================================================================

    fn update<R>(
        &self,
        target: Target<'_>,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<(String, R)> {
        let now = self.now();
        let (session_id, output) = {
            let mut state = self.write();
            let session_id = match target {
                Target::Active => state
                    .active_session_id
                    .clone()
                    .ok_or(CastingError::NoActiveSession)?,
                Target::Session(id) => id.to_string(),
            };
            let session = match state.sessions.get_mut(&session_id) {
                Some(session) => session,
                None => {
                    return Err(match target {
                        Target::Active => CastingError::NoActiveSession,
                        Target::Session(_) => CastingError::not_found("Session", session_id),
                    });
                }
            };
            let output = f(session);
            session.last_updated = now;
            (session_id, output)
        };

        self.publish(vec![StoreEvent::SessionUpdated {
            session_id: session_id.clone(),
        }]);
        Ok((session_id, output))
    }

    /// Applies `f` to the active session and stamps `last_updated`.
    ///
    /// Fails with [`CastingError::NoActiveSession`] when there is no active
    /// session. Returns the session id alongside `f`'s output.
    pub fn update_active_session<R>(
        &self,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<(String, R)> {
        self.update(Target::Active, f)
    }

    /// Applies `f` to session `id` regardless of which session is active.
    pub fn update_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Result<R> {
        self.update(Target::Session(id), f).map(|(_, output)| output)
    }

    /// Stores a server rendering and its version on the active session.
    pub fn update_yaml_content(
        &self,
        yaml_content: impl Into<String>,
        version_id: u64,
    ) -> Result<()> {
        let yaml_content = yaml_content.into();
        self.update_active_session(|session| {
            session.yaml_content = yaml_content;
            session.version_id = version_id;
        })
        .map(|_| ())
    }

    pub fn set_casting_method(&self, method: CastingMethod) -> Result<()> {
        self.update_active_session(|session| session.casting_method = method)
            .map(|_| ())
    }

    /// Points the active session at a screenplay. Empty values keep the old ones.
    pub fn set_screenplay_source(&self, name: &str, json_path: &str) -> Result<()> {
        let patch = SessionPatch::new()
            .screenplay_name(name)
            .screenplay_json_path(json_path);
        self.update_active_session(|session| session.apply_patch(patch))
            .map(|_| ())
    }

    // ============================================================================
    // Preferences and UI state
    // ============================================================================

    pub fn preferences(&self) -> Preferences {
        self.read().preferences.clone()
    }

    fn update_preferences<R>(&self, f: impl FnOnce(&mut Preferences) -> R) -> R {
        let output = f(&mut self.write().preferences);
        self.publish(vec![StoreEvent::PreferencesChanged]);
        output
    }

    pub fn add_recent_project(&self, path: impl Into<String>) {
        let limit = self.recent_projects_limit;
        self.update_preferences(|prefs| prefs.add_recent_project(path, limit));
    }

    /// Returns whether the voice is now starred.
    pub fn toggle_starred_voice(&self, provider: &str, voice_id: &str) -> bool {
        self.update_preferences(|prefs| prefs.toggle_starred_voice(provider, voice_id))
    }

    pub fn set_preferred_provider(&self, provider: Option<String>) {
        self.update_preferences(|prefs| prefs.preferred_provider = provider);
    }

    pub fn ui(&self) -> UiState {
        self.read().ui.clone()
    }

    /// UI state is never persisted, so this neither bumps the revision nor
    /// publishes an event.
    pub fn update_ui(&self, f: impl FnOnce(&mut UiState)) {
        f(&mut self.write().ui);
    }

    pub fn set_last_error(&self, error: Option<String>) {
        self.update_ui(|ui| ui.last_error = error);
    }
}
