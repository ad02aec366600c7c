//! Durable key-value storage trait.

use async_trait::async_trait;

use crate::error::Result;

/// A generic key-value persistence medium (local file, browser storage, ...).
///
/// The casting state lives under a single namespaced key; implementations
/// only need string get/set.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if nothing was stored.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;
}
