//! Application layer of the casting store.
//!
//! [`SessionStore`] owns the in-memory state, [`CastingController`] runs the
//! optimistic commit protocol against a [`CastingBackend`], and [`CastingApp`]
//! ties both to persistence with an optional autosave task.
//!
//! [`CastingBackend`]: sts_core::backend::CastingBackend

pub mod app;
pub mod casting;
pub mod session;
pub mod voice_catalog;

pub use app::CastingApp;
pub use casting::CastingController;
pub use session::{SessionStore, StoreListener, SubscriptionId};
pub use voice_catalog::VoiceCatalog;
