//! Server-of-record collaborators.
//!
//! The backend owns the authoritative YAML document and the version token.
//! The casting core only relies on the request/response contract below; the
//! transport is an implementation detail of whoever implements the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CastingError, Result};
use crate::session::{Assignment, INITIAL_VERSION, VoiceRecord};

/// One `updateCharacterAssignment` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCommit {
    pub session_id: String,
    pub character: String,
    /// Full assignment to store. An empty assignment removes the character.
    pub assignment: Assignment,
    /// Version the client based its edit on.
    pub expected_version: u64,
}

/// Authoritative state returned by an accepted commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub yaml_content: String,
    pub version_id: u64,
}

/// Backend endpoint that commits character assignments with optimistic locking.
///
/// A version mismatch must be reported as [`CastingError::VersionConflict`];
/// any other failure may use whichever variant describes it best.
#[async_trait]
pub trait CastingBackend: Send + Sync {
    async fn update_character_assignment(
        &self,
        commit: AssignmentCommit,
    ) -> Result<CommitReceipt>;
}

/// Provider/voice metadata service backing the per-session voice cache.
#[async_trait]
pub trait VoiceMetadataService: Send + Sync {
    async fn fetch_voice(&self, provider: &str, voice_id: &str) -> Result<VoiceRecord>;
}

/// A value guarded by a monotonically increasing version (compare-and-swap).
///
/// `commit` succeeds only when the caller's expected version matches the
/// stored one, and then bumps the version by exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedValue<T> {
    version: u64,
    value: T,
}

impl<T> VersionedValue<T> {
    pub fn new(value: T) -> Self {
        Self::with_version(value, INITIAL_VERSION)
    }

    pub fn with_version(value: T, version: u64) -> Self {
        Self { version, value }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Replaces the value if `expected_version` is current; returns the new version.
    pub fn commit(&mut self, expected_version: u64, new_value: T) -> Result<u64> {
        self.commit_with(expected_version, |value| *value = new_value)
            .map(|(version, ())| version)
    }

    /// Applies `update` in place if `expected_version` is current.
    pub fn commit_with<R>(
        &mut self,
        expected_version: u64,
        update: impl FnOnce(&mut T) -> R,
    ) -> Result<(u64, R)> {
        if expected_version != self.version {
            return Err(CastingError::VersionConflict {
                expected: expected_version,
                actual: self.version,
            });
        }
        let output = update(&mut self.value);
        self.version += 1;
        Ok((self.version, output))
    }
}

impl<T: Clone> VersionedValue<T> {
    /// Like [`Self::commit_with`], but `update` may fail.
    ///
    /// `update` runs against a copy; on error neither the value nor the
    /// version changes.
    pub fn try_commit_with<R>(
        &mut self,
        expected_version: u64,
        update: impl FnOnce(&mut T) -> Result<R>,
    ) -> Result<(u64, R)> {
        if expected_version != self.version {
            return Err(CastingError::VersionConflict {
                expected: expected_version,
                actual: self.version,
            });
        }
        let mut next = self.value.clone();
        let output = update(&mut next)?;
        self.value = next;
        self.version += 1;
        Ok((self.version, output))
    }
}
