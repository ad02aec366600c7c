//! Error types for the casting core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the casting session store and its collaborators.
///
/// Store-internal invariant violations (`NoActiveSession`) are surfaced to the
/// caller. Environmental failures (network, decode) are expected to be turned
/// into a well-defined fallback by the layer that observes them.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CastingError {
    /// A character-assignment operation was invoked with no active session.
    #[error("No active casting session")]
    NoActiveSession,

    /// The backend refused to commit an assignment (network error or conflict).
    #[error("Commit rejected for character '{character}': {reason}")]
    CommitRejected {
        character: String,
        reason: Box<CastingError>,
    },

    /// Optimistic-lock mismatch reported by the server of record.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// Durable storage held data that could not be decoded.
    #[error("Decode failure: {message}")]
    Decode { message: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "YAML"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Transport or backend failure that is not a version conflict
    #[error("Backend error: {0}")]
    Backend(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CastingError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps a backend failure as a rejected commit for `character`.
    pub fn commit_rejected(character: impl Into<String>, reason: CastingError) -> Self {
        Self::CommitRejected {
            character: character.into(),
            reason: Box::new(reason),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NoActiveSession error
    pub fn is_no_active_session(&self) -> bool {
        matches!(self, Self::NoActiveSession)
    }

    /// Check if this is a rejected commit
    pub fn is_commit_rejected(&self) -> bool {
        matches!(self, Self::CommitRejected { .. })
    }

    /// Check if this error is, or wraps, a version conflict.
    pub fn is_version_conflict(&self) -> bool {
        match self {
            Self::VersionConflict { .. } => true,
            Self::CommitRejected { reason, .. } => reason.is_version_conflict(),
            _ => false,
        }
    }

    /// Check if this is a decode failure
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CastingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CastingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CastingError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CastingError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error
impl From<anyhow::Error> for CastingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for CastingError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, CastingError>`.
pub type Result<T> = std::result::Result<T, CastingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_rejected_wraps_conflict() {
        let err = CastingError::commit_rejected(
            "JOHN",
            CastingError::VersionConflict {
                expected: 3,
                actual: 4,
            },
        );
        assert!(err.is_commit_rejected());
        assert!(err.is_version_conflict());
        assert_eq!(
            err.to_string(),
            "Commit rejected for character 'JOHN': Version conflict: expected 3, found 4"
        );
    }

    #[test]
    fn test_backend_failure_is_not_conflict() {
        let err = CastingError::commit_rejected("JANE", CastingError::backend("timeout"));
        assert!(err.is_commit_rejected());
        assert!(!err.is_version_conflict());
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CastingError = io.into();
        match err {
            CastingError::Io { message } => assert!(message.contains("NotFound")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_serializes_for_ipc() {
        let err = CastingError::NoActiveSession;
        let json = serde_json::to_string(&err).unwrap();
        let back: CastingError = serde_json::from_str(&json).unwrap();
        assert!(back.is_no_active_session());
    }
}
