//! Application state: the in-memory casting state, its persisted
//! projection, and the storage interface it is written through.

pub mod model;
pub mod repository;

pub use model::{
    CastingState, DEFAULT_RECENT_PROJECTS_LIMIT, PersistedState, Preferences, UiState,
};
pub use repository::KeyValueStorage;
