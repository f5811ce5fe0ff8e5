//! Domain records persisted by the storage layer.
//!
//! Status-like columns are closed enums stored as their string ids; the
//! row mappers in `storage::sqlite` parse them back out.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::tools::Tool;

/// Where a skill originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillSource {
    Local,
    Registry,
    VersionControl,
    Mirror,
}

impl SkillSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Registry => "registry",
            Self::VersionControl => "version-control",
            Self::Mirror => "mirror",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Self::Local),
            "registry" => Ok(Self::Registry),
            "version-control" => Ok(Self::VersionControl),
            "mirror" => Ok(Self::Mirror),
            other => Err(SyncError::Validation(format!("unknown skill source: {other}"))),
        }
    }

    /// Whether this source has a remote counterpart to check for updates.
    #[must_use]
    pub const fn is_remote(self) -> bool {
        !matches!(self, Self::Local)
    }
}

/// A skill in the central library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub source: SkillSource,
    pub source_url: Option<String>,
    pub checksum: Option<String>,
    pub local_path: String,
    pub last_modified_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Set when an external change was auto-absorbed into the library and
    /// is awaiting an operator decision. Non-null iff a watcher change is
    /// pending; cleared only by the three resolution actions.
    pub watcher_modified_at: Option<String>,
    /// Backup taken just before the absorption overwrote the library.
    pub watcher_backup_id: Option<String>,
    /// Deployment whose on-disk change triggered the absorption.
    pub watcher_trigger_dep_id: Option<String>,
}

impl SkillRecord {
    /// Whether a watcher-absorbed change awaits resolution.
    #[must_use]
    pub const fn watcher_pending(&self) -> bool {
        self.watcher_modified_at.is_some()
    }
}

/// Install-time provenance for remotely-sourced skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSourceRecord {
    pub skill_id: String,
    pub installed_version: Option<String>,
    /// Library checksum recorded at install time; drives `locally_modified`.
    pub original_checksum: Option<String>,
    /// Remote folder SHA recorded at install time; drives `has_update`.
    pub remote_sha: Option<String>,
    pub owner_repo: Option<String>,
    pub remote_path: Option<String>,
    pub updated_at: String,
}

/// Deployment status, re-evaluated by the reconciler. No state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Deployed checksum equals the current library checksum.
    Synced,
    /// Deployment exists but its content differs from the library.
    Diverged,
    /// Deployment path no longer exists on disk.
    Missing,
    /// Content on disk under a tool convention with no deployment record.
    Untracked,
    /// Freshly created, not yet verified.
    Pending,
}

impl DeploymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Diverged => "diverged",
            Self::Missing => "missing",
            Self::Untracked => "untracked",
            Self::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "synced" => Ok(Self::Synced),
            "diverged" => Ok(Self::Diverged),
            "missing" => Ok(Self::Missing),
            "untracked" => Ok(Self::Untracked),
            "pending" => Ok(Self::Pending),
            other => Err(SyncError::Validation(format!(
                "unknown deployment status: {other}"
            ))),
        }
    }
}

/// A single placement of a skill's files for one tool, optionally scoped
/// to a project. At most one deployment per (skill, project, tool).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: String,
    pub skill_id: String,
    /// `None` means a global (user-level) deployment.
    pub project_id: Option<String>,
    pub tool: Tool,
    pub path: String,
    pub checksum: Option<String>,
    pub status: DeploymentStatus,
    pub last_synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A registered project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub path: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Kind of detected divergence or filesystem notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEventType {
    Modified,
    Created,
    Deleted,
    ChecksumMismatch,
    UntrackedSkill,
}

impl ChangeEventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modified => "modified",
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::ChecksumMismatch => "checksum_mismatch",
            Self::UntrackedSkill => "untracked_skill",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "modified" => Ok(Self::Modified),
            "created" => Ok(Self::Created),
            "deleted" => Ok(Self::Deleted),
            "checksum_mismatch" => Ok(Self::ChecksumMismatch),
            "untracked_skill" => Ok(Self::UntrackedSkill),
            other => Err(SyncError::Validation(format!("unknown event type: {other}"))),
        }
    }
}

/// How a change event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventResolution {
    Pending,
    Resolved,
    Ignored,
}

impl EventResolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            "ignored" => Ok(Self::Ignored),
            other => Err(SyncError::Validation(format!(
                "unknown event resolution: {other}"
            ))),
        }
    }
}

/// Immutable record of a detected divergence. References may outlive the
/// deployment they point at; consumers display "unknown" rather than fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEventRecord {
    pub id: String,
    pub deployment_id: String,
    pub event_type: ChangeEventType,
    pub old_checksum: Option<String>,
    pub new_checksum: Option<String>,
    pub resolution: EventResolution,
    pub resolved_at: Option<String>,
    pub created_at: String,
}

/// Sync action kinds recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Deploy,
    Update,
    Delete,
    Export,
    Import,
    Restore,
}

impl SyncAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Import => "import",
            Self::Restore => "restore",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "deploy" => Ok(Self::Deploy),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "export" => Ok(Self::Export),
            "import" => Ok(Self::Import),
            "restore" => Ok(Self::Restore),
            other => Err(SyncError::Validation(format!("unknown sync action: {other}"))),
        }
    }
}

/// Append-only audit entry for every executed sync action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistoryRecord {
    pub id: String,
    pub skill_id: Option<String>,
    pub deployment_id: Option<String>,
    pub action: SyncAction,
    pub from_checksum: Option<String>,
    pub to_checksum: Option<String>,
    /// `success` or `failed`.
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: String,
}

/// Why a backup snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupReason {
    PreUpdate,
    PreRestore,
    Manual,
}

impl BackupReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreUpdate => "pre-update",
            Self::PreRestore => "pre-restore",
            Self::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pre-update" => Ok(Self::PreUpdate),
            "pre-restore" => Ok(Self::PreRestore),
            "manual" => Ok(Self::Manual),
            other => Err(SyncError::Validation(format!("unknown backup reason: {other}"))),
        }
    }
}

/// A preserved snapshot of a skill's file set. Never auto-deleted by the
/// core; retention is an external policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: String,
    pub skill_id: String,
    pub version_label: Option<String>,
    pub backup_path: String,
    pub checksum: Option<String>,
    pub reason: BackupReason,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            DeploymentStatus::Synced,
            DeploymentStatus::Diverged,
            DeploymentStatus::Missing,
            DeploymentStatus::Untracked,
            DeploymentStatus::Pending,
        ] {
            assert_eq!(DeploymentStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(DeploymentStatus::parse("weird").is_err());
    }

    #[test]
    fn source_round_trips() {
        for source in [
            SkillSource::Local,
            SkillSource::Registry,
            SkillSource::VersionControl,
            SkillSource::Mirror,
        ] {
            assert_eq!(SkillSource::parse(source.as_str()).unwrap(), source);
        }
    }

    #[test]
    fn only_local_source_is_not_remote() {
        assert!(!SkillSource::Local.is_remote());
        assert!(SkillSource::Registry.is_remote());
        assert!(SkillSource::VersionControl.is_remote());
        assert!(SkillSource::Mirror.is_remote());
    }

    #[test]
    fn event_type_round_trips() {
        for kind in [
            ChangeEventType::Modified,
            ChangeEventType::Created,
            ChangeEventType::Deleted,
            ChangeEventType::ChecksumMismatch,
            ChangeEventType::UntrackedSkill,
        ] {
            assert_eq!(ChangeEventType::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn backup_reason_round_trips() {
        for reason in [
            BackupReason::PreUpdate,
            BackupReason::PreRestore,
            BackupReason::Manual,
        ] {
            assert_eq!(BackupReason::parse(reason.as_str()).unwrap(), reason);
        }
    }
}
