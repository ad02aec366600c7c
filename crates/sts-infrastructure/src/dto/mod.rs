//! Data Transfer Objects (DTOs) for persistence.
//!
//! DTOs carry schema versions and migrate forward to the latest version
//! before conversion to domain models.

pub mod casting_state;

pub use casting_state::{
    CASTING_STATE_ENTITY, CastingStateDTO, CastingStateV1_0, CastingStateV1_1, PreferencesDTO,
    SessionDTO, VoiceRecordDTO, create_casting_state_migrator,
};
