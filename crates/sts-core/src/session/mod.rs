//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Core session model (`Session`, `Assignment`, `VoiceRecord`)
//! - `stats`: Derived progress (`SessionStats`)
//! - `event`: Store change notifications (`StoreEvent`)

mod event;
mod model;
mod stats;

// Re-export public API
pub use event::StoreEvent;
pub use model::{
    Assignment, CastingMethod, INITIAL_VERSION, MetadataFields, Session, SessionPatch,
    VoiceFields, VoiceRecord, voice_cache_key,
};
pub use stats::SessionStats;
