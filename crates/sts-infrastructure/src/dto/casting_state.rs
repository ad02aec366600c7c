//! Persisted casting state DTOs and migrations
//!
//! Maps and sets inside the document use the tagged container encoding so
//! that keyed collections and set semantics survive the JSON round trip.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use version_migrate::{IntoDomain, Versioned};

use sts_core::session::{Assignment, CastingMethod, INITIAL_VERSION, Session, VoiceRecord};
use sts_core::state::{PersistedState, Preferences};
use sts_core::{CastingError, Result};

use crate::codec::{tagged_map, tagged_set};

/// Cached voice metadata DTO.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceRecordDTO {
    pub provider: String,
    pub sts_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "tagged_set")]
    pub tags: HashSet<String>,
}

fn default_version_id() -> u64 {
    INITIAL_VERSION
}

/// Casting session DTO.
///
/// Assignments are stored in their wire shape; only the keyed containers
/// change representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDTO {
    pub session_id: String,
    #[serde(default)]
    pub screenplay_name: String,
    #[serde(default)]
    pub screenplay_json_path: String,
    #[serde(default, with = "tagged_map")]
    pub assignments: HashMap<String, Assignment>,
    #[serde(default)]
    pub casting_method: CastingMethod,
    #[serde(default)]
    pub yaml_content: String,
    #[serde(default, with = "tagged_map")]
    pub voice_cache: HashMap<String, VoiceRecordDTO>,
    #[serde(default = "default_version_id")]
    pub version_id: u64,
    #[serde(default)]
    pub last_updated: i64,
}

/// Preferences DTO introduced in V1.1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesDTO {
    #[serde(default)]
    pub recent_projects: Vec<String>,
    #[serde(default, with = "tagged_set")]
    pub starred_voices: HashSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<String>,
}

/// Casting state V1.0.0 (initial version).
///
/// Recent projects lived at the top level; there were no starred voices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct CastingStateV1_0 {
    #[serde(default)]
    pub recent_projects: Vec<String>,
    #[serde(default, with = "tagged_map")]
    pub sessions: HashMap<String, SessionDTO>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<String>,
}

/// Casting state V1.1.0.
///
/// Groups user preferences and adds starred voices and the preferred provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct CastingStateV1_1 {
    #[serde(default)]
    pub preferences: PreferencesDTO,
    #[serde(default, with = "tagged_map")]
    pub sessions: HashMap<String, SessionDTO>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<String>,
}

/// Type alias for the latest casting state version.
pub type CastingStateDTO = CastingStateV1_1;

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from CastingStateV1_0 to CastingStateV1_1.
impl version_migrate::MigratesTo<CastingStateV1_1> for CastingStateV1_0 {
    fn migrate(self) -> CastingStateV1_1 {
        CastingStateV1_1 {
            preferences: PreferencesDTO {
                recent_projects: self.recent_projects,
                starred_voices: HashSet::new(),
                preferred_provider: None,
            },
            sessions: self.sessions,
            active_session_id: self.active_session_id,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<VoiceRecordDTO> for VoiceRecord {
    fn from(dto: VoiceRecordDTO) -> Self {
        VoiceRecord {
            provider: dto.provider,
            sts_id: dto.sts_id,
            display_name: dto.display_name,
            description: dto.description,
            tags: dto.tags,
        }
    }
}

impl From<VoiceRecord> for VoiceRecordDTO {
    fn from(record: VoiceRecord) -> Self {
        VoiceRecordDTO {
            provider: record.provider,
            sts_id: record.sts_id,
            display_name: record.display_name,
            description: record.description,
            tags: record.tags,
        }
    }
}

impl From<SessionDTO> for Session {
    fn from(dto: SessionDTO) -> Self {
        Session {
            session_id: dto.session_id,
            screenplay_name: dto.screenplay_name,
            screenplay_json_path: dto.screenplay_json_path,
            assignments: dto.assignments,
            casting_method: dto.casting_method,
            yaml_content: dto.yaml_content,
            voice_cache: dto
                .voice_cache
                .into_iter()
                .map(|(key, record)| (key, record.into()))
                .collect(),
            version_id: dto.version_id,
            last_updated: dto.last_updated,
        }
    }
}

impl From<Session> for SessionDTO {
    fn from(session: Session) -> Self {
        SessionDTO {
            session_id: session.session_id,
            screenplay_name: session.screenplay_name,
            screenplay_json_path: session.screenplay_json_path,
            assignments: session.assignments,
            casting_method: session.casting_method,
            yaml_content: session.yaml_content,
            voice_cache: session
                .voice_cache
                .into_iter()
                .map(|(key, record)| (key, record.into()))
                .collect(),
            version_id: session.version_id,
            last_updated: session.last_updated,
        }
    }
}

impl From<PreferencesDTO> for Preferences {
    fn from(dto: PreferencesDTO) -> Self {
        Preferences {
            recent_projects: dto.recent_projects,
            starred_voices: dto.starred_voices,
            preferred_provider: dto.preferred_provider,
        }
    }
}

impl From<Preferences> for PreferencesDTO {
    fn from(preferences: Preferences) -> Self {
        PreferencesDTO {
            recent_projects: preferences.recent_projects,
            starred_voices: preferences.starred_voices,
            preferred_provider: preferences.preferred_provider,
        }
    }
}

/// Convert CastingStateV1_1 DTO to domain model.
impl IntoDomain<PersistedState> for CastingStateV1_1 {
    fn into_domain(self) -> PersistedState {
        PersistedState {
            preferences: self.preferences.into(),
            sessions: self
                .sessions
                .into_iter()
                .map(|(id, session)| (id, session.into()))
                .collect(),
            active_session_id: self.active_session_id,
        }
    }
}

/// Convert domain model to CastingStateV1_1 DTO for persistence.
impl version_migrate::FromDomain<PersistedState> for CastingStateV1_1 {
    fn from_domain(state: PersistedState) -> Self {
        CastingStateV1_1 {
            preferences: state.preferences.into(),
            sessions: state
                .sessions
                .into_iter()
                .map(|(id, session)| (id, session.into()))
                .collect(),
            active_session_id: state.active_session_id,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Entity name the casting state is registered under.
pub const CASTING_STATE_ENTITY: &str = "casting_state";

/// Creates a Migrator for the persisted casting state.
///
/// # Migration Path
///
/// - V1.0 → V1.1: Moves `recentProjects` under `preferences`, adds `starredVoices`
/// - V1.1 → PersistedState: Converts DTO to domain model
pub fn create_casting_state_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    let state_path = version_migrate::Migrator::define(CASTING_STATE_ENTITY)
        .from::<CastingStateV1_0>()
        .step::<CastingStateV1_1>()
        .into_with_save::<PersistedState>();

    migrator.register(state_path).map_err(|e| {
        CastingError::Migration(format!(
            "Failed to register {} migration path: {}",
            CASTING_STATE_ENTITY, e
        ))
    })?;

    Ok(migrator)
}
