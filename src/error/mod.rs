//! Error handling for skillsync.
//!
//! This module provides:
//! - [`SyncError`]: The main error enum for all skillsync operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type for robot-mode output

mod codes;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for skillsync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    #[error("Deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Path unavailable: {}", .path.display())]
    PathUnavailable { path: PathBuf },

    #[error("Written content for {} hashed to {actual}, expected {expected}", .path.display())]
    ChecksumMismatchAfterWrite {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Merge has unresolved conflicts: {}", .paths.join(", "))]
    MergeConflictUnresolved { paths: Vec<String> },

    #[error("No backup available for skill {0}; refusing partial restore")]
    NoBackupAvailable(String),

    #[error("Skill {0} has no pending watcher change")]
    WatcherNotPending(String),

    #[error("Deployment {0} is busy with another operation")]
    Busy(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl SyncError {
    /// Get the error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Yaml(_) => ErrorCode::SerializationError,
            Self::Http(_) | Self::Remote(_) => ErrorCode::RemoteError,
            Self::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Self::DeploymentNotFound(_) => ErrorCode::DeploymentNotFound,
            Self::ProjectNotFound(_) => ErrorCode::ProjectNotFound,
            Self::BackupNotFound(_) => ErrorCode::BackupNotFound,
            Self::PathUnavailable { .. } => ErrorCode::PathUnavailable,
            Self::ChecksumMismatchAfterWrite { .. } => ErrorCode::ChecksumMismatchAfterWrite,
            Self::MergeConflictUnresolved { .. } => ErrorCode::MergeConflictUnresolved,
            Self::NoBackupAvailable(_) => ErrorCode::NoBackupAvailable,
            Self::WatcherNotPending(_) => ErrorCode::WatcherNotPending,
            Self::Busy(_) => ErrorCode::Busy,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Timeout(_) => ErrorCode::Timeout,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::SkillNotFound(id) | Self::WatcherNotPending(id) | Self::NoBackupAvailable(id) => {
                Some(serde_json::json!({ "skill_id": id }))
            }
            Self::DeploymentNotFound(id) | Self::Busy(id) => {
                Some(serde_json::json!({ "deployment_id": id }))
            }
            Self::ProjectNotFound(id) => Some(serde_json::json!({ "project_id": id })),
            Self::BackupNotFound(id) => Some(serde_json::json!({ "backup_id": id })),
            Self::PathUnavailable { path } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            Self::ChecksumMismatchAfterWrite {
                path,
                expected,
                actual,
            } => Some(serde_json::json!({
                "path": path.display().to_string(),
                "expected": expected,
                "actual": actual,
            })),
            Self::MergeConflictUnresolved { paths } => {
                Some(serde_json::json!({ "paths": paths }))
            }
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_sync_error(self)
    }
}

/// A structured error with machine-readable code and context.
///
/// Designed for `--json` output where scripts and agents need to parse
/// errors and take appropriate action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SKILL_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "merge", "filesystem")
    pub category: String,
}

impl StructuredError {
    /// Create a structured error from a [`SyncError`].
    #[must_use]
    pub fn from_sync_error(err: &SyncError) -> Self {
        let code = err.code();
        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            context: err.context(),
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<SyncError> for StructuredError {
    fn from(err: SyncError) -> Self {
        Self::from_sync_error(&err)
    }
}

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping() {
        assert_eq!(
            SyncError::SkillNotFound("test".into()).code(),
            ErrorCode::SkillNotFound
        );
        assert_eq!(SyncError::Busy("d1".into()).code(), ErrorCode::Busy);
        assert_eq!(
            SyncError::NoBackupAvailable("s1".into()).code(),
            ErrorCode::NoBackupAvailable
        );
    }

    #[test]
    fn error_context() {
        let err = SyncError::DeploymentNotFound("dep-42".into());
        let ctx = err.context().unwrap();
        assert_eq!(ctx.get("deployment_id").unwrap(), "dep-42");
    }

    #[test]
    fn structured_error_serialization() {
        let err = SyncError::MergeConflictUnresolved {
            paths: vec!["SKILL.md".into()],
        };
        let structured = err.to_structured();
        assert_eq!(structured.numeric_code, 301);
        assert!(structured.recoverable);
        assert_eq!(structured.category, "merge");

        let json = serde_json::to_string(&structured).unwrap();
        assert!(json.contains("MERGE_CONFLICT_UNRESOLVED"));
        assert!(json.contains("SKILL.md"));
    }

    #[test]
    fn structured_error_display() {
        let err = SyncError::SkillNotFound("frontend-design".into());
        let display = err.to_structured().to_string();
        assert!(display.contains("E101"));
        assert!(display.contains("frontend-design"));
    }
}
