//! Machine-readable error codes.

use serde::{Deserialize, Serialize};

/// Standardized error codes for machine parsing.
///
/// Codes are grouped by hundreds: 1xx skill/deployment lookup, 2xx
/// filesystem, 3xx merge/conflict, 4xx backup/watcher, 5xx concurrency,
/// 6xx config, 7xx remote, 9xx internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SkillNotFound,
    DeploymentNotFound,
    ProjectNotFound,
    BackupNotFound,
    PathUnavailable,
    IoError,
    ChecksumMismatchAfterWrite,
    MergeConflictUnresolved,
    ConflictExistsDifferent,
    NoBackupAvailable,
    WatcherNotPending,
    Busy,
    ConfigInvalid,
    ValidationFailed,
    RemoteError,
    Timeout,
    DatabaseError,
    SerializationError,
    Internal,
}

impl ErrorCode {
    /// Numeric code for robot-mode output.
    #[must_use]
    pub const fn numeric(self) -> u16 {
        match self {
            Self::SkillNotFound => 101,
            Self::DeploymentNotFound => 102,
            Self::ProjectNotFound => 103,
            Self::BackupNotFound => 104,
            Self::PathUnavailable => 201,
            Self::IoError => 202,
            Self::ChecksumMismatchAfterWrite => 203,
            Self::MergeConflictUnresolved => 301,
            Self::ConflictExistsDifferent => 302,
            Self::NoBackupAvailable => 401,
            Self::WatcherNotPending => 402,
            Self::Busy => 501,
            Self::ConfigInvalid => 601,
            Self::ValidationFailed => 602,
            Self::RemoteError => 701,
            Self::Timeout => 702,
            Self::DatabaseError => 901,
            Self::SerializationError => 902,
            Self::Internal => 999,
        }
    }

    /// Whether the user can plausibly recover without code changes.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::DatabaseError | Self::Internal)
    }

    /// Error category for grouping in output.
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::SkillNotFound
            | Self::DeploymentNotFound
            | Self::ProjectNotFound
            | Self::BackupNotFound => "lookup",
            Self::PathUnavailable | Self::IoError | Self::ChecksumMismatchAfterWrite => {
                "filesystem"
            }
            Self::MergeConflictUnresolved | Self::ConflictExistsDifferent => "merge",
            Self::NoBackupAvailable | Self::WatcherNotPending => "watcher",
            Self::Busy => "concurrency",
            Self::ConfigInvalid | Self::ValidationFailed => "config",
            Self::RemoteError | Self::Timeout => "remote",
            Self::DatabaseError | Self::SerializationError | Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.numeric())
    }
}
