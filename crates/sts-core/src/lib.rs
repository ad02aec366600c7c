//! Domain layer of the Script to Speech voice-casting store.
//!
//! Holds the session and state models, the shared error type and the traits
//! implemented by infrastructure (storage, backend, voice metadata).

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod screenplay;
pub mod session;
pub mod state;

// Re-export common error type
pub use error::{CastingError, Result};
