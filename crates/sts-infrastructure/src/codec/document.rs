use sts_core::state::PersistedState;
use sts_core::{CastingError, Result};

use crate::dto::{CASTING_STATE_ENTITY, create_casting_state_migrator};

/// Encodes and decodes the persisted casting state document.
///
/// Output is always the latest schema version. Older documents are migrated
/// forward on decode.
pub struct StateCodec {
    migrator: version_migrate::Migrator,
}

impl StateCodec {
    pub fn new() -> Result<Self> {
        Ok(Self {
            migrator: create_casting_state_migrator()?,
        })
    }

    pub fn encode(&self, state: &PersistedState) -> Result<String> {
        self.migrator
            .save_domain_flat(CASTING_STATE_ENTITY, state)
            .map_err(|e| CastingError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to encode casting state: {}", e),
            })
    }

    /// Decodes a stored document.
    ///
    /// Malformed JSON, a wrong container tag or an unknown schema version
    /// all surface as [`CastingError::Decode`].
    pub fn decode(&self, raw: &str) -> Result<PersistedState> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| CastingError::decode(format!("Invalid casting state JSON: {}", e)))?;

        self.migrator
            .load_flat_from(CASTING_STATE_ENTITY, value)
            .map_err(|e| CastingError::decode(format!("Failed to migrate casting state: {}", e)))
    }
}
