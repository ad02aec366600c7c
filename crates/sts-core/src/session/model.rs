//! Casting session domain model.
//!
//! A [`Session`] is one screenplay's casting workspace: the character to voice
//! assignments, the server-rendered YAML mirror and the optimistic-lock token.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Version assigned to a session that has never been committed.
pub const INITIAL_VERSION: u64 = 1;

/// How the assignments of a session were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CastingMethod {
    #[default]
    Manual,
    LlmAssisted,
}

/// One character's voice casting state.
///
/// Voice fields (`provider`, `sts_id`, `provider_config`) and casting metadata
/// (`casting_notes`, `role`, `additional_notes`) are written independently:
/// a write to one group never clobbers the other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// TTS provider; an empty string means no voice is assigned.
    #[serde(default)]
    pub provider: String,
    /// Library voice identifier. Absent for custom voices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sts_id: Option<String>,
    /// Provider-specific configuration for custom voices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<BTreeMap<String, Value>>,
    #[serde(
        rename = "castingNotes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub casting_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<Vec<String>>,

    // Screenplay analysis; read-only for the casting store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_characters: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longest_dialogue: Option<u32>,
}

/// Voice half of an assignment write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceFields {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sts_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<BTreeMap<String, Value>>,
}

impl VoiceFields {
    /// A voice from the provider's voice library.
    pub fn library(provider: impl Into<String>, sts_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            sts_id: Some(sts_id.into()),
            provider_config: None,
        }
    }

    /// An ad-hoc voice described by provider configuration.
    pub fn custom(provider: impl Into<String>, config: BTreeMap<String, Value>) -> Self {
        Self {
            provider: provider.into(),
            sts_id: None,
            provider_config: Some(config),
        }
    }
}

/// Metadata half of an assignment write. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFields {
    #[serde(rename = "castingNotes", default)]
    pub casting_notes: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<Vec<String>>,
}

impl MetadataFields {
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::default()
        }
    }

    pub fn casting_notes(notes: impl Into<String>) -> Self {
        Self {
            casting_notes: Some(notes.into()),
            ..Self::default()
        }
    }
}

impl Assignment {
    /// True when a real voice is bound: a provider plus either a library id
    /// or a custom configuration.
    pub fn has_voice(&self) -> bool {
        let has_library_id = self.sts_id.as_deref().is_some_and(|id| !id.is_empty());
        !self.provider.is_empty() && (has_library_id || self.provider_config.is_some())
    }

    /// True when any casting metadata is present.
    pub fn has_metadata(&self) -> bool {
        self.casting_notes.is_some() || self.role.is_some() || self.additional_notes.is_some()
    }

    /// True for the empty payload used to remove a character remotely.
    pub fn is_cleared(&self) -> bool {
        self.provider.is_empty()
            && self.sts_id.is_none()
            && self.provider_config.is_none()
            && !self.has_metadata()
    }

    /// Replaces the voice fields, keeping metadata and screenplay stats.
    pub fn apply_voice(&mut self, voice: VoiceFields) {
        self.provider = voice.provider;
        self.sts_id = voice.sts_id;
        self.provider_config = voice.provider_config;
    }

    /// Overwrites the metadata fields that are present in `metadata`.
    pub fn apply_metadata(&mut self, metadata: MetadataFields) {
        if let Some(notes) = metadata.casting_notes {
            self.casting_notes = Some(notes);
        }
        if let Some(role) = metadata.role {
            self.role = Some(role);
        }
        if let Some(notes) = metadata.additional_notes {
            self.additional_notes = Some(notes);
        }
    }

    /// Clears `provider`, `sts_id` and `provider_config` only.
    pub fn clear_voice(&mut self) {
        self.provider.clear();
        self.sts_id = None;
        self.provider_config = None;
    }
}

/// Cached metadata for one provider voice, keyed by `provider:voice_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceRecord {
    pub provider: String,
    pub sts_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
}

/// Composite key used by [`Session::voice_cache`].
pub fn voice_cache_key(provider: &str, voice_id: &str) -> String {
    format!("{}:{}", provider, voice_id)
}

/// Represents a voice casting session for one screenplay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique among live sessions
    pub session_id: String,
    pub screenplay_name: String,
    pub screenplay_json_path: String,
    /// Character name (case-sensitive) to assignment
    pub assignments: HashMap<String, Assignment>,
    pub casting_method: CastingMethod,
    /// Last-known-good server rendering of all assignments
    pub yaml_content: String,
    /// Read-through cache keyed by `provider:voice_id`
    pub voice_cache: HashMap<String, VoiceRecord>,
    /// Optimistic-lock token issued by the backend
    pub version_id: u64,
    /// Milliseconds since the Unix epoch
    pub last_updated: i64,
}

impl Session {
    /// Creates an empty manual session at the initial version.
    pub fn new(session_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            session_id: session_id.into(),
            screenplay_name: String::new(),
            screenplay_json_path: String::new(),
            assignments: HashMap::new(),
            casting_method: CastingMethod::Manual,
            yaml_content: String::new(),
            voice_cache: HashMap::new(),
            version_id: INITIAL_VERSION,
            last_updated: now_ms,
        }
    }

    /// Builds a new session from a partial description, defaulting the rest.
    pub fn from_patch(session_id: impl Into<String>, patch: SessionPatch, now_ms: i64) -> Self {
        let mut session = Self::new(session_id, now_ms);
        session.apply_patch(patch);
        session
    }

    /// Merges `patch` field by field.
    ///
    /// Non-empty strings overwrite, empty or absent ones keep the prior value.
    /// Containers are replaced wholesale only when supplied.
    pub fn apply_patch(&mut self, patch: SessionPatch) {
        if let Some(name) = patch.screenplay_name.filter(|s| !s.is_empty()) {
            self.screenplay_name = name;
        }
        if let Some(path) = patch.screenplay_json_path.filter(|s| !s.is_empty()) {
            self.screenplay_json_path = path;
        }
        if let Some(yaml) = patch.yaml_content.filter(|s| !s.is_empty()) {
            self.yaml_content = yaml;
        }
        if let Some(assignments) = patch.assignments {
            self.assignments = assignments;
        }
        if let Some(cache) = patch.voice_cache {
            self.voice_cache = cache;
        }
        if let Some(method) = patch.casting_method {
            self.casting_method = method;
        }
        if let Some(version) = patch.version_id {
            self.version_id = version;
        }
    }
}

/// Partial session data accepted by `select_or_create_session`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default)]
    pub screenplay_name: Option<String>,
    #[serde(default)]
    pub screenplay_json_path: Option<String>,
    #[serde(default)]
    pub assignments: Option<HashMap<String, Assignment>>,
    #[serde(default)]
    pub casting_method: Option<CastingMethod>,
    #[serde(default)]
    pub yaml_content: Option<String>,
    #[serde(default)]
    pub voice_cache: Option<HashMap<String, VoiceRecord>>,
    #[serde(default)]
    pub version_id: Option<u64>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screenplay_name(mut self, name: impl Into<String>) -> Self {
        self.screenplay_name = Some(name.into());
        self
    }

    pub fn screenplay_json_path(mut self, path: impl Into<String>) -> Self {
        self.screenplay_json_path = Some(path.into());
        self
    }

    pub fn assignments(mut self, assignments: HashMap<String, Assignment>) -> Self {
        self.assignments = Some(assignments);
        self
    }

    pub fn casting_method(mut self, method: CastingMethod) -> Self {
        self.casting_method = Some(method);
        self
    }

    pub fn yaml_content(mut self, yaml: impl Into<String>) -> Self {
        self.yaml_content = Some(yaml.into());
        self
    }

    pub fn version_id(mut self, version: u64) -> Self {
        self.version_id = Some(version);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new("s-1", 42);
        assert_eq!(session.version_id, INITIAL_VERSION);
        assert_eq!(session.casting_method, CastingMethod::Manual);
        assert!(session.assignments.is_empty());
        assert_eq!(session.last_updated, 42);
    }

    #[test]
    fn test_metadata_then_voice_keeps_both() {
        let mut assignment = Assignment::default();
        assignment.apply_metadata(MetadataFields::role("X"));
        assignment.apply_voice(VoiceFields::library("openai", "alloy"));

        assert_eq!(assignment.role.as_deref(), Some("X"));
        assert_eq!(assignment.provider, "openai");
        assert_eq!(assignment.sts_id.as_deref(), Some("alloy"));
    }

    #[test]
    fn test_metadata_write_preserves_voice() {
        let mut assignment = Assignment::default();
        assignment.apply_voice(VoiceFields::library("openai", "alloy"));
        assignment.apply_metadata(MetadataFields::casting_notes("gravelly"));

        assert!(assignment.has_voice());
        assert_eq!(assignment.casting_notes.as_deref(), Some("gravelly"));
    }

    #[test]
    fn test_clear_voice_keeps_metadata() {
        let mut assignment = Assignment {
            provider: "openai".into(),
            sts_id: Some("alloy".into()),
            role: Some("lead".into()),
            casting_notes: Some("warm".into()),
            additional_notes: Some(vec!["# aside".into()]),
            ..Assignment::default()
        };
        assignment.clear_voice();

        assert!(!assignment.has_voice());
        assert_eq!(assignment.role.as_deref(), Some("lead"));
        assert_eq!(assignment.casting_notes.as_deref(), Some("warm"));
        assert_eq!(assignment.additional_notes.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_has_voice_rules() {
        let metadata_only = Assignment {
            role: Some("lead".into()),
            ..Assignment::default()
        };
        assert!(!metadata_only.has_voice());

        let provider_only = Assignment {
            provider: "openai".into(),
            ..Assignment::default()
        };
        assert!(!provider_only.has_voice());

        let empty_id = Assignment {
            provider: "openai".into(),
            sts_id: Some(String::new()),
            ..Assignment::default()
        };
        assert!(!empty_id.has_voice());

        let custom = Assignment {
            provider: "elevenlabs".into(),
            provider_config: Some(BTreeMap::from([(
                "voice_id".to_string(),
                Value::String("abc".into()),
            )])),
            ..Assignment::default()
        };
        assert!(custom.has_voice());
    }

    #[test]
    fn test_patch_preserves_assignments_when_absent() {
        let mut session = Session::new("s-1", 0);
        session
            .assignments
            .insert("JOHN".into(), Assignment::default());

        session.apply_patch(SessionPatch::new().screenplay_name("Heist"));

        assert_eq!(session.screenplay_name, "Heist");
        assert_eq!(session.assignments.len(), 1);
    }

    #[test]
    fn test_patch_empty_strings_do_not_overwrite() {
        let mut session = Session::from_patch(
            "s-1",
            SessionPatch::new()
                .screenplay_name("Heist")
                .screenplay_json_path("/tmp/heist.json"),
            0,
        );
        session.apply_patch(SessionPatch::new().screenplay_name("").screenplay_json_path(""));

        assert_eq!(session.screenplay_name, "Heist");
        assert_eq!(session.screenplay_json_path, "/tmp/heist.json");
    }

    #[test]
    fn test_patch_replaces_supplied_assignments() {
        let mut session = Session::new("s-1", 0);
        session
            .assignments
            .insert("JOHN".into(), Assignment::default());

        let replacement = HashMap::from([("JANE".to_string(), Assignment::default())]);
        session.apply_patch(SessionPatch::new().assignments(replacement));

        assert!(session.assignments.contains_key("JANE"));
        assert!(!session.assignments.contains_key("JOHN"));
    }

    #[test]
    fn test_casting_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&CastingMethod::LlmAssisted).unwrap(),
            "\"llm-assisted\""
        );
        assert_eq!(
            serde_json::to_string(&CastingMethod::Manual).unwrap(),
            "\"manual\""
        );
    }

    #[test]
    fn test_voice_cache_key() {
        assert_eq!(voice_cache_key("openai", "alloy"), "openai:alloy");
    }
}
