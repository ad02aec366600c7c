//! Derived casting progress for a session.

use serde::{Deserialize, Serialize};

use super::model::Session;
use crate::screenplay::ScreenplayCharacters;

/// Progress summary computed from a session and, optionally, the screenplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Characters to cast
    pub total: usize,
    /// Characters with a real voice bound
    pub assigned: usize,
    pub completed: bool,
    pub last_updated: i64,
}

impl SessionStats {
    /// Computes stats for `session`.
    ///
    /// `total` is the screenplay character count when `characters` is given,
    /// otherwise the number of assignment entries. Metadata-only entries are
    /// never counted as assigned.
    pub fn compute(session: &Session, characters: Option<&ScreenplayCharacters>) -> Self {
        let total = match characters {
            Some(screenplay) => screenplay.len(),
            None => session.assignments.len(),
        };
        let assigned = session
            .assignments
            .values()
            .filter(|assignment| assignment.has_voice())
            .count();

        Self {
            total,
            assigned,
            completed: total > 0 && assigned >= total,
            last_updated: session.last_updated,
        }
    }
}
