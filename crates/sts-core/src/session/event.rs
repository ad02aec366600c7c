use serde::{Deserialize, Serialize};

/// Change notifications published by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A session was created or re-selected and is now active.
    SessionSelected { session_id: String, created: bool },
    /// A session's content changed.
    SessionUpdated { session_id: String },
    /// A session was removed from the collection.
    SessionDeleted { session_id: String },
    /// The active pointer was cleared.
    ActiveSessionCleared,
    /// The whole state was replaced (e.g. primed from storage).
    StateReplaced,
    /// Persisted user preferences changed.
    PreferencesChanged,
}

impl StoreEvent {
    /// Session id the event refers to, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::SessionSelected { session_id, .. }
            | Self::SessionUpdated { session_id }
            | Self::SessionDeleted { session_id } => Some(session_id),
            _ => None,
        }
    }
}
