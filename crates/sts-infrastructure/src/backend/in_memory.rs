use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use sts_core::backend::{AssignmentCommit, CastingBackend, CommitReceipt, VersionedValue};
use sts_core::screenplay::ScreenplayCharacters;
use sts_core::session::Assignment;
use sts_core::{CastingError, Result};

use crate::yaml::render_assignments_yaml;

#[derive(Default)]
struct BackendSession {
    document: Option<VersionedValue<HashMap<String, Assignment>>>,
    characters: Option<ScreenplayCharacters>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, BackendSession>,
    fail_next: Option<CastingError>,
}

/// Process-local server of record.
///
/// Keeps one versioned assignment document per session, enforces the
/// expected-version check and renders the YAML mirror on every accepted
/// commit. Sessions spring into existence at the initial version on first
/// commit.
#[derive(Default)]
pub struct InMemoryCastingBackend {
    inner: Mutex<Inner>,
}

impl InMemoryCastingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers screenplay data used to order and annotate the YAML.
    pub async fn register_screenplay(&self, session_id: &str, characters: ScreenplayCharacters) {
        let mut inner = self.inner.lock().await;
        inner
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .characters = Some(characters);
    }

    /// Seeds a session at an explicit version, replacing any stored document.
    pub async fn seed_session(
        &self,
        session_id: &str,
        assignments: HashMap<String, Assignment>,
        version: u64,
    ) {
        let mut inner = self.inner.lock().await;
        inner
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .document = Some(VersionedValue::with_version(assignments, version));
    }

    /// Makes the next commit fail with `error` without touching state.
    pub async fn fail_next_commit(&self, error: CastingError) {
        self.inner.lock().await.fail_next = Some(error);
    }

    /// Current version of `session_id`, if it has ever been committed or seeded.
    pub async fn version(&self, session_id: &str) -> Option<u64> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .get(session_id)
            .and_then(|s| s.document.as_ref())
            .map(VersionedValue::version)
    }

    pub async fn assignments(&self, session_id: &str) -> HashMap<String, Assignment> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .get(session_id)
            .and_then(|s| s.document.as_ref())
            .map(|doc| doc.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CastingBackend for InMemoryCastingBackend {
    async fn update_character_assignment(&self, commit: AssignmentCommit) -> Result<CommitReceipt> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.fail_next.take() {
            tracing::debug!(
                "[InMemoryCastingBackend] Injected failure for '{}': {}",
                commit.character,
                error
            );
            return Err(error);
        }

        let AssignmentCommit {
            session_id,
            character,
            assignment,
            expected_version,
        } = commit;
        let BackendSession {
            document,
            characters,
        } = inner.sessions.entry(session_id).or_default();
        let document = document.get_or_insert_with(|| VersionedValue::new(HashMap::new()));

        // Rendering runs on the prospective document so a failure stores nothing.
        let (version_id, yaml_content) = document.try_commit_with(expected_version, |doc| {
            if assignment.is_cleared() {
                doc.remove(&character);
            } else {
                doc.insert(character.clone(), assignment);
            }
            render_assignments_yaml(doc, characters.as_ref())
        })?;

        tracing::debug!(
            "[InMemoryCastingBackend] Committed '{}' at version {}",
            character,
            version_id
        );
        Ok(CommitReceipt {
            yaml_content,
            version_id,
        })
    }
}
