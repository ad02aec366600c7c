//! Session application services.
//!
//! `SessionStore` owns the in-memory casting state; every mutation of a
//! session goes through its update primitive.

mod store;

pub use store::{SessionStore, StoreListener, SubscriptionId};
