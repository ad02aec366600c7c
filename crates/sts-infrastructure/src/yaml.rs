//! Rendering of voice assignments as a speaker configuration YAML document.
//!
//! Speakers are ordered `default` first, then by line count (descending),
//! then by name. Each speaker is preceded by comment lines carrying its
//! dialogue statistics and casting metadata.

use std::collections::HashMap;

use serde_yaml::{Mapping, Value};
use sts_core::screenplay::{CharacterInfo, ScreenplayCharacters};
use sts_core::session::Assignment;
use sts_core::{CastingError, Result};

const DEFAULT_SPEAKER: &str = "default";

const HEADER_LINES: [&str; 6] = [
    "Voice configuration for speakers",
    "Each speaker requires:",
    "  provider: The TTS provider to use",
    "  Additional provider-specific configuration fields",
    "  Optional fields can be included at the root level",
    "",
];

fn yaml_error(e: serde_yaml::Error) -> CastingError {
    CastingError::Serialization {
        format: "YAML".to_string(),
        message: e.to_string(),
    }
}

/// Prefers a non-zero value carried by the assignment over screenplay data.
fn stat(
    assignment_value: Option<u32>,
    info: Option<&CharacterInfo>,
    pick: fn(&CharacterInfo) -> u32,
) -> u32 {
    assignment_value
        .filter(|n| *n > 0)
        .or_else(|| info.map(pick))
        .unwrap_or(0)
}

fn comment_lines(
    name: &str,
    assignment: &Assignment,
    info: Option<&CharacterInfo>,
) -> Vec<String> {
    let mut lines = Vec::new();

    let line_count = stat(assignment.line_count, info, |i| i.line_count);
    if line_count > 0 {
        let total = stat(assignment.total_characters, info, |i| i.total_characters);
        let longest = stat(assignment.longest_dialogue, info, |i| i.longest_dialogue);
        lines.push(format!("{}: {} lines", name, line_count));
        lines.push(format!(
            "Total characters: {}, Longest dialogue: {} characters",
            total, longest
        ));
    }

    if let Some(notes) = assignment.casting_notes.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Casting notes: {}", notes));
    }
    if let Some(role) = assignment.role.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Role: {}", role));
    }
    for note in assignment.additional_notes.iter().flatten() {
        let clean = note.trim_start_matches('#').trim();
        if !clean.is_empty() {
            lines.push(clean.to_string());
        }
    }
    lines
}

fn speaker_config(assignment: &Assignment) -> Result<Mapping> {
    let mut config = Mapping::new();
    config.insert("provider".into(), assignment.provider.clone().into());
    if let Some(sts_id) = assignment.sts_id.as_deref().filter(|s| !s.is_empty()) {
        config.insert("sts_id".into(), sts_id.into());
    }
    // BTreeMap iteration is already key-sorted.
    for (key, value) in assignment.provider_config.iter().flatten() {
        if key == "provider" || key == "sts_id" {
            continue;
        }
        config.insert(
            key.as_str().into(),
            serde_yaml::to_value(value).map_err(yaml_error)?,
        );
    }
    Ok(config)
}

fn push_comments(out: &mut String, lines: &[String]) {
    for line in lines {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
}

/// Renders `assignments` as speaker YAML.
///
/// `characters` supplies line counts for ordering and comments when the
/// assignments themselves do not carry them.
pub fn render_assignments_yaml(
    assignments: &HashMap<String, Assignment>,
    characters: Option<&ScreenplayCharacters>,
) -> Result<String> {
    let info_for = |name: &str| characters.and_then(|c| c.get(name));

    let mut ordered: Vec<(&String, &Assignment)> = assignments.iter().collect();
    ordered.sort_by(|(a_name, a), (b_name, b)| {
        let a_lines = stat(a.line_count, info_for(a_name.as_str()), |i| i.line_count);
        let b_lines = stat(b.line_count, info_for(b_name.as_str()), |i| i.line_count);
        (a_name.as_str() != DEFAULT_SPEAKER)
            .cmp(&(b_name.as_str() != DEFAULT_SPEAKER))
            .then_with(|| b_lines.cmp(&a_lines))
            .then_with(|| a_name.cmp(b_name))
    });

    let mut out = String::new();
    for (idx, (name, assignment)) in ordered.into_iter().enumerate() {
        let comments = comment_lines(name, assignment, info_for(name.as_str()));
        if !comments.is_empty() {
            let mut all = Vec::with_capacity(comments.len() + HEADER_LINES.len());
            if idx == 0 {
                all.extend(HEADER_LINES.iter().map(|s| s.to_string()));
            } else {
                all.push(String::new());
            }
            all.extend(comments);
            push_comments(&mut out, &all);
        }

        let mut speaker = Mapping::new();
        speaker.insert(name.as_str().into(), Value::Mapping(speaker_config(assignment)?));
        out.push_str(&serde_yaml::to_string(&speaker).map_err(yaml_error)?);
    }

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use sts_core::session::{MetadataFields, VoiceFields};

    fn voiced(provider: &str, id: &str) -> Assignment {
        let mut assignment = Assignment::default();
        assignment.apply_voice(VoiceFields::library(provider, id));
        assignment
    }

    #[test]
    fn test_default_first_then_by_line_count() {
        let assignments = HashMap::from([
            ("JANE".to_string(), voiced("openai", "nova")),
            ("default".to_string(), voiced("openai", "onyx")),
            ("JOHN".to_string(), voiced("openai", "alloy")),
        ]);
        let characters = ScreenplayCharacters::from_iter([
            CharacterInfo::new("JOHN", 40),
            CharacterInfo::new("JANE", 12),
        ]);

        let yaml = render_assignments_yaml(&assignments, Some(&characters)).unwrap();

        let default_at = yaml.find("default:").unwrap();
        let john_at = yaml.find("JOHN:").unwrap();
        let jane_at = yaml.find("JANE:").unwrap();
        assert!(default_at < john_at);
        assert!(john_at < jane_at);
        assert!(yaml.contains("# JOHN: 40 lines"));
    }

    #[test]
    fn test_header_only_when_first_speaker_has_comments() {
        let assignments = HashMap::from([("JOHN".to_string(), voiced("openai", "alloy"))]);

        let bare = render_assignments_yaml(&assignments, None).unwrap();
        assert_eq!(bare, "JOHN:\n  provider: openai\n  sts_id: alloy");

        let characters = ScreenplayCharacters::from_iter([CharacterInfo::new("JOHN", 3)]);
        let commented = render_assignments_yaml(&assignments, Some(&characters)).unwrap();
        assert!(commented.starts_with("# Voice configuration for speakers\n"));
    }

    #[test]
    fn test_provider_config_fields_sorted_after_provider() {
        let mut assignment = Assignment::default();
        assignment.apply_voice(VoiceFields::custom(
            "elevenlabs",
            BTreeMap::from([
                ("voice_id".to_string(), json!("abc")),
                ("provider".to_string(), json!("ignored")),
                ("stability".to_string(), json!(0.5)),
            ]),
        ));
        let assignments = HashMap::from([("NARRATOR".to_string(), assignment)]);

        let yaml = render_assignments_yaml(&assignments, None).unwrap();

        assert_eq!(
            yaml,
            "NARRATOR:\n  provider: elevenlabs\n  stability: 0.5\n  voice_id: abc"
        );
    }

    #[test]
    fn test_metadata_comments() {
        let mut assignment = voiced("openai", "alloy");
        assignment.apply_metadata(MetadataFields {
            casting_notes: Some("gravelly".into()),
            role: Some("lead".into()),
            additional_notes: Some(vec!["# ages badly".into(), "#".into()]),
        });
        let assignments = HashMap::from([("JOHN".to_string(), assignment)]);

        let yaml = render_assignments_yaml(&assignments, None).unwrap();

        assert!(yaml.contains("# Casting notes: gravelly\n# Role: lead\n# ages badly\nJOHN:"));
    }
}
