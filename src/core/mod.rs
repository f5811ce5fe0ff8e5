//! Core domain types: records, checksum identity.

pub mod checksum;
pub mod models;

pub use checksum::{checksum_dir, checksum_tree, Checksum, FileTree};
pub use models::{
    BackupReason, BackupRecord, ChangeEventRecord, ChangeEventType, DeploymentRecord,
    DeploymentStatus, EventResolution, ProjectRecord, SkillRecord, SkillSource,
    SkillSourceRecord, SyncAction, SyncHistoryRecord,
};
