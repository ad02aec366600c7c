//! Screenplay character data consumed by the casting store.
//!
//! The parsing pipeline that produces this data is outside the casting core;
//! the store only reads it to compute progress and to order rendered YAML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dialogue statistics for one speaker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub name: String,
    pub line_count: u32,
    #[serde(default)]
    pub total_characters: u32,
    #[serde(default)]
    pub longest_dialogue: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub casting_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl CharacterInfo {
    pub fn new(name: impl Into<String>, line_count: u32) -> Self {
        Self {
            name: name.into(),
            line_count,
            ..Self::default()
        }
    }
}

/// Characters of one screenplay, keyed by speaker name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenplayCharacters {
    pub characters: HashMap<String, CharacterInfo>,
}

impl ScreenplayCharacters {
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CharacterInfo> {
        self.characters.get(name)
    }
}

impl FromIterator<CharacterInfo> for ScreenplayCharacters {
    fn from_iter<I: IntoIterator<Item = CharacterInfo>>(iter: I) -> Self {
        Self {
            characters: iter
                .into_iter()
                .map(|info| (info.name.clone(), info))
                .collect(),
        }
    }
}
