use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

use sts_core::backend::{AssignmentCommit, CastingBackend, CommitReceipt};
use sts_core::session::{Assignment, MetadataFields, Session, VoiceFields};
use sts_core::{CastingError, Result};

use crate::session::SessionStore;

/// Optimistic character-assignment edits against the active session.
///
/// Each committing edit is applied locally at once, then sent to the backend
/// with the session's current version. An accepted commit replaces the local
/// YAML mirror and version with the server's; a rejected one restores the
/// exact pre-edit value and returns [`CastingError::CommitRejected`].
///
/// Every edit to a session, local-only ones included, takes that session's
/// turn. A queued edit snapshots only when it reaches the front, so a
/// rollback always restores a confirmed value and never overwrites a later
/// edit. Nothing is retried automatically.
pub struct CastingController {
    store: Arc<SessionStore>,
    backend: Arc<dyn CastingBackend>,
    /// Per-session turn locks. Entries nobody holds or waits on are dropped.
    gates: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

/// Pre-edit value of one character plus what to send.
struct Staged {
    snapshot: Option<Assignment>,
    payload: Assignment,
    expected_version: u64,
}

impl CastingController {
    pub fn new(store: Arc<SessionStore>, backend: Arc<dyn CastingBackend>) -> Self {
        Self {
            store,
            backend,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    async fn gate(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        gates.retain(|_, gate| gate.strong_count() > 0);
        if let Some(gate) = gates.get(session_id).and_then(Weak::upgrade) {
            return gate;
        }
        let gate = Arc::new(Mutex::new(()));
        gates.insert(session_id.to_string(), Arc::downgrade(&gate));
        gate
    }

    /// Waits for the active session's turn.
    async fn take_turn(&self) -> Result<(String, OwnedMutexGuard<()>)> {
        let session_id = self
            .store
            .active_session_id()
            .ok_or(CastingError::NoActiveSession)?;
        let turn = self.gate(&session_id).await.lock_owned().await;
        Ok((session_id, turn))
    }

    /// Applies `f` to a session whose turn is held.
    fn update_in_turn<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R> {
        self.store.update_session(session_id, f).map_err(|e| match e {
            // The session was deleted while the edit waited its turn.
            CastingError::NotFound { .. } => CastingError::NoActiveSession,
            other => other,
        })
    }

    /// Binds a voice to `character`, keeping its metadata.
    pub async fn set_character_voice(
        &self,
        character: &str,
        voice: VoiceFields,
    ) -> Result<CommitReceipt> {
        self.edit_and_commit(character, move |entry| {
            entry.get_or_insert_with(Assignment::default).apply_voice(voice);
        })
        .await
    }

    /// Writes casting metadata for `character`, keeping its voice.
    pub async fn set_character_metadata(
        &self,
        character: &str,
        metadata: MetadataFields,
    ) -> Result<CommitReceipt> {
        self.edit_and_commit(character, move |entry| {
            entry
                .get_or_insert_with(Assignment::default)
                .apply_metadata(metadata);
        })
        .await
    }

    /// Removes the whole entry locally and commits an empty assignment.
    pub async fn remove_character_assignment(&self, character: &str) -> Result<CommitReceipt> {
        self.edit_and_commit(character, |entry| *entry = None).await
    }

    /// Clears only the voice fields of `character`. Local only.
    ///
    /// Metadata survives. Follow with [`Self::commit_character`] to make the
    /// change authoritative.
    pub async fn remove_voice_from_assignment(&self, character: &str) -> Result<()> {
        let (session_id, _turn) = self.take_turn().await?;
        let found = self.update_in_turn(&session_id, |session| {
            match session.assignments.get_mut(character) {
                Some(assignment) => {
                    assignment.clear_voice();
                    true
                }
                None => false,
            }
        })?;
        tracing::debug!(
            "[CastingController] Cleared voice of '{}' in {} (present: {})",
            character,
            session_id,
            found
        );
        Ok(())
    }

    /// Replaces every assignment of the active session. Local only.
    pub async fn import_assignments(
        &self,
        assignments: HashMap<String, Assignment>,
    ) -> Result<()> {
        let count = assignments.len();
        let (session_id, _turn) = self.take_turn().await?;
        self.update_in_turn(&session_id, |session| session.assignments = assignments)?;
        tracing::info!(
            "[CastingController] Imported {} assignment(s) into {}",
            count,
            session_id
        );
        Ok(())
    }

    /// Commits the current local value of `character` without changing it.
    ///
    /// A missing entry is committed as the empty assignment. Nothing is rolled
    /// back on failure.
    pub async fn commit_character(&self, character: &str) -> Result<CommitReceipt> {
        let (session_id, _turn) = self.take_turn().await?;

        let (payload, expected_version) = self
            .store
            .session(&session_id)
            .map(|session| {
                (
                    session.assignments.get(character).cloned().unwrap_or_default(),
                    session.version_id,
                )
            })
            .ok_or(CastingError::NoActiveSession)?;

        match self
            .send(&session_id, character, payload, expected_version)
            .await
        {
            Ok(receipt) => {
                self.reconcile(&session_id, &receipt);
                Ok(receipt)
            }
            Err(e) => Err(self.reject(character, e)),
        }
    }

    async fn edit_and_commit(
        &self,
        character: &str,
        edit: impl FnOnce(&mut Option<Assignment>),
    ) -> Result<CommitReceipt> {
        let (session_id, _turn) = self.take_turn().await?;

        let staged = self.update_in_turn(&session_id, |session| {
            let snapshot = session.assignments.get(character).cloned();
            let mut entry = snapshot.clone();
            edit(&mut entry);
            match &entry {
                Some(assignment) => {
                    session
                        .assignments
                        .insert(character.to_string(), assignment.clone());
                }
                None => {
                    session.assignments.remove(character);
                }
            }
            Staged {
                snapshot,
                payload: entry.unwrap_or_default(),
                expected_version: session.version_id,
            }
        })?;

        match self
            .send(&session_id, character, staged.payload, staged.expected_version)
            .await
        {
            Ok(receipt) => {
                self.reconcile(&session_id, &receipt);
                Ok(receipt)
            }
            Err(e) => {
                self.rollback(&session_id, character, staged.snapshot);
                Err(self.reject(character, e))
            }
        }
    }

    async fn send(
        &self,
        session_id: &str,
        character: &str,
        assignment: Assignment,
        expected_version: u64,
    ) -> Result<CommitReceipt> {
        tracing::debug!(
            "[CastingController] Committing '{}' in {} at version {}",
            character,
            session_id,
            expected_version
        );
        let receipt = self
            .backend
            .update_character_assignment(AssignmentCommit {
                session_id: session_id.to_string(),
                character: character.to_string(),
                assignment,
                expected_version,
            })
            .await?;

        if receipt.version_id <= expected_version {
            return Err(CastingError::backend(format!(
                "Backend returned version {} for a commit based on version {}",
                receipt.version_id, expected_version
            )));
        }
        Ok(receipt)
    }

    fn reconcile(&self, session_id: &str, receipt: &CommitReceipt) {
        let applied = self.store.update_session(session_id, |session| {
            session.yaml_content = receipt.yaml_content.clone();
            session.version_id = receipt.version_id;
        });
        match applied {
            Ok(()) => {
                self.store.set_last_error(None);
                tracing::debug!(
                    "[CastingController] {} reconciled at version {}",
                    session_id,
                    receipt.version_id
                );
            }
            Err(e) => tracing::warn!(
                "[CastingController] Dropping receipt for {}: {}",
                session_id,
                e
            ),
        }
    }

    fn rollback(&self, session_id: &str, character: &str, snapshot: Option<Assignment>) {
        let restored = self.store.update_session(session_id, |session| match snapshot {
            Some(previous) => {
                session.assignments.insert(character.to_string(), previous);
            }
            None => {
                session.assignments.remove(character);
            }
        });
        if let Err(e) = restored {
            tracing::warn!(
                "[CastingController] Cannot roll back '{}' in {}: {}",
                character,
                session_id,
                e
            );
        }
    }

    fn reject(&self, character: &str, reason: CastingError) -> CastingError {
        let error = CastingError::commit_rejected(character, reason);
        tracing::warn!("[CastingController] {}", error);
        self.store.set_last_error(Some(error.to_string()));
        error
    }
}
