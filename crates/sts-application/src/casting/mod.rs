//! Optimistic assignment edits and their commit/rollback protocol.

mod controller;

pub use controller::CastingController;
