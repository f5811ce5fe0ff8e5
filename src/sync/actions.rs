//! Directional sync actions with safety rails.
//!
//! The prescribed order for every mutating action: backup before the
//! destructive write, status and history updates after. A crash mid-way
//! leaves the original content backed up rather than a silently-corrupted
//! mix.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::checksum::{checksum_dir, checksum_tree};
use crate::core::models::{
    BackupReason, DeploymentRecord, DeploymentStatus, SkillRecord, SyncAction, SyncHistoryRecord,
};
use crate::error::{Result, SyncError};
use crate::storage::Database;
use crate::sync::backups::BackupStore;
use crate::sync::locks::DeploymentLocks;
use crate::tools::Tool;
use crate::utils::fs::{read_tree, remove_tree, write_tree};
use crate::utils::now_rfc3339;

/// Why a deploy did not copy anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    /// Target already holds exactly the library content.
    ExistsSame,
    /// Target holds divergent content; pass `force` to overwrite.
    ExistsDifferent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictInfo {
    pub status: ConflictStatus,
    pub existing_checksum: Option<String>,
    pub library_checksum: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub files_copied: usize,
    pub old_checksum: Option<String>,
    pub new_checksum: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub deployment_id: Option<String>,
    pub deploy_path: String,
    pub files_copied: usize,
    pub conflict: Option<ConflictInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateLibraryOutcome {
    pub skill_id: String,
    pub skill_name: String,
    pub backup_id: Option<String>,
    pub new_checksum: Option<String>,
    pub other_deployments_synced: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub skill_id: String,
    pub restored_version: Option<String>,
    pub new_checksum: Option<String>,
    pub deployments_synced: usize,
}

/// Executes resolution decisions against deployments and the library.
pub struct SyncExecutor {
    db: Arc<Database>,
    locks: Arc<DeploymentLocks>,
    backups: BackupStore,
    home: PathBuf,
}

impl SyncExecutor {
    pub const fn new(
        db: Arc<Database>,
        locks: Arc<DeploymentLocks>,
        backups: BackupStore,
        home: PathBuf,
    ) -> Self {
        Self {
            db,
            locks,
            backups,
            home,
        }
    }

    /// Copy library content over a deployment, verify, and mark it synced.
    pub fn sync_deployment(&self, deployment_id: &str) -> Result<SyncOutcome> {
        let _guard = self.locks.try_acquire(deployment_id)?;
        self.sync_deployment_locked(deployment_id)
    }

    /// Same as [`Self::sync_deployment`] for callers already holding the
    /// per-deployment lock.
    fn sync_deployment_locked(&self, deployment_id: &str) -> Result<SyncOutcome> {
        let dep = self.db.require_deployment(deployment_id)?;
        let skill = self.db.require_skill(&dep.skill_id)?;

        let result = self.push_library(&skill, &dep);
        match &result {
            Ok(outcome) => {
                self.record_history(
                    Some(&skill.id),
                    Some(&dep.id),
                    SyncAction::Deploy,
                    outcome.old_checksum.as_deref(),
                    outcome.new_checksum.as_deref(),
                    None,
                );
            }
            Err(err) => {
                self.record_history(
                    Some(&skill.id),
                    Some(&dep.id),
                    SyncAction::Deploy,
                    dep.checksum.as_deref(),
                    None,
                    Some(&err.to_string()),
                );
            }
        }
        result
    }

    /// The raw library→deployment copy. Status is only updated after a
    /// verified write; any failure leaves the recorded state untouched.
    fn push_library(&self, skill: &SkillRecord, dep: &DeploymentRecord) -> Result<SyncOutcome> {
        let library_dir = Path::new(&skill.local_path);
        if !library_dir.exists() {
            return Err(SyncError::PathUnavailable {
                path: library_dir.to_path_buf(),
            });
        }

        let tree = read_tree(library_dir)?;
        let expected = checksum_tree(&tree);

        let target = Path::new(&dep.path);
        remove_tree(target)?;
        let outcome = write_tree(target, &tree)?;
        if let Some(first) = outcome.failures.first() {
            return Err(SyncError::Validation(format!(
                "write to {} failed at {}: {}",
                dep.path, first.path, first.error
            )));
        }

        // Post-write verification: catches concurrent external edits and
        // filesystem corruption before the record claims `synced`.
        let written = checksum_dir(target)?;
        if written.as_ref().map(crate::core::Checksum::as_str)
            != expected.as_ref().map(crate::core::Checksum::as_str)
        {
            return Err(SyncError::ChecksumMismatchAfterWrite {
                path: target.to_path_buf(),
                expected: expected.map_or_else(String::new, |c| c.into_string()),
                actual: written.map_or_else(String::new, |c| c.into_string()),
            });
        }

        let new_checksum = expected.map(crate::core::Checksum::into_string);
        self.db
            .mark_deployment_synced(&dep.id, new_checksum.as_deref())?;

        info!(
            deployment = %dep.id,
            files = outcome.files_written,
            "deployment synced from library"
        );
        Ok(SyncOutcome {
            files_copied: outcome.files_written,
            old_checksum: dep.checksum.clone(),
            new_checksum,
        })
    }

    /// Pull a deployment's content back into the library, optionally
    /// propagating to every other deployment of the skill.
    pub fn update_library_from_deployment(
        &self,
        deployment_id: &str,
        propagate: bool,
    ) -> Result<UpdateLibraryOutcome> {
        let mut outcome = {
            let _guard = self.locks.try_acquire(deployment_id)?;
            let dep = self.db.require_deployment(deployment_id)?;
            let skill = self.db.require_skill(&dep.skill_id)?;

            let deploy_dir = Path::new(&dep.path);
            if !deploy_dir.exists() {
                return Err(SyncError::PathUnavailable {
                    path: deploy_dir.to_path_buf(),
                });
            }

            let backup = self.backups.create(&skill, BackupReason::PreUpdate)?;

            let tree = read_tree(deploy_dir)?;
            let outcome = write_replacing(Path::new(&skill.local_path), &tree)?;
            let new_checksum = checksum_tree(&tree).map(crate::core::Checksum::into_string);

            self.db
                .update_skill_checksum(&skill.id, new_checksum.as_deref())?;
            self.db
                .set_source_original_checksum(&skill.id, new_checksum.as_deref())?;
            self.db
                .mark_deployment_synced(&dep.id, new_checksum.as_deref())?;

            self.record_history(
                Some(&skill.id),
                Some(&dep.id),
                SyncAction::Update,
                skill.checksum.as_deref(),
                new_checksum.as_deref(),
                None,
            );

            info!(
                skill = %skill.name,
                deployment = %dep.id,
                files = outcome,
                "library updated from deployment"
            );

            UpdateLibraryOutcome {
                skill_id: skill.id,
                skill_name: skill.name,
                backup_id: backup.map(|b| b.id),
                new_checksum,
                other_deployments_synced: 0,
            }
        };
        // Trigger lock released; propagation takes each sibling's own lock.
        if propagate {
            outcome.other_deployments_synced =
                self.sync_other_deployments(&outcome.skill_id, deployment_id)?;
        }
        Ok(outcome)
    }

    /// Push the library to every deployment of `skill_id` except `except`.
    /// Per-item failures are isolated and recorded in history.
    pub fn sync_other_deployments(&self, skill_id: &str, except: &str) -> Result<usize> {
        let mut synced = 0usize;
        for other in self.db.list_deployments_for_skill(skill_id)? {
            if other.id == except {
                continue;
            }
            match self.sync_deployment(&other.id) {
                Ok(_) => synced += 1,
                Err(err) => {
                    warn!(deployment = %other.id, error = %err, "propagation failed");
                }
            }
        }
        Ok(synced)
    }

    /// Deploy a skill to a tool target, creating or updating the
    /// deployment record. Conflicting existing content is reported, not
    /// overwritten, unless `force` is set.
    pub fn deploy_to_target(
        &self,
        skill_id: &str,
        tool: Tool,
        project_id: Option<&str>,
        force: bool,
    ) -> Result<DeployOutcome> {
        let skill = self.db.require_skill(skill_id)?;
        let library_dir = Path::new(&skill.local_path);
        if !library_dir.exists() {
            return Err(SyncError::PathUnavailable {
                path: library_dir.to_path_buf(),
            });
        }

        let target = match project_id {
            Some(pid) => {
                let project = self
                    .db
                    .get_project(pid)?
                    .ok_or_else(|| SyncError::ProjectNotFound(pid.to_string()))?;
                tool.project_skill_path(Path::new(&project.path), &skill.name)
            }
            None => tool.global_skill_path(&self.home, &skill.name),
        };
        let deploy_path = target.to_string_lossy().to_string();

        let library_tree = read_tree(library_dir)?;
        let library_checksum = checksum_tree(&library_tree).map(crate::core::Checksum::into_string);

        if target.exists() && !force {
            let existing_checksum = checksum_dir(&target)?.map(crate::core::Checksum::into_string);
            if existing_checksum == library_checksum {
                // Identical content already in place: idempotent success.
                let id = self.upsert_target_deployment(
                    &skill,
                    tool,
                    project_id,
                    &deploy_path,
                    library_checksum.as_deref(),
                )?;
                return Ok(DeployOutcome {
                    deployment_id: Some(id),
                    deploy_path,
                    files_copied: 0,
                    conflict: Some(ConflictInfo {
                        status: ConflictStatus::ExistsSame,
                        existing_checksum,
                        library_checksum,
                    }),
                });
            }
            return Ok(DeployOutcome {
                deployment_id: None,
                deploy_path,
                files_copied: 0,
                conflict: Some(ConflictInfo {
                    status: ConflictStatus::ExistsDifferent,
                    existing_checksum,
                    library_checksum,
                }),
            });
        }

        let files_copied = write_replacing(&target, &library_tree)?;
        let id = self.upsert_target_deployment(
            &skill,
            tool,
            project_id,
            &deploy_path,
            library_checksum.as_deref(),
        )?;

        self.record_history(
            Some(&skill.id),
            Some(&id),
            SyncAction::Deploy,
            None,
            library_checksum.as_deref(),
            None,
        );

        info!(skill = %skill.name, tool = %tool, path = %deploy_path, "skill deployed");
        Ok(DeployOutcome {
            deployment_id: Some(id),
            deploy_path,
            files_copied,
            conflict: None,
        })
    }

    fn upsert_target_deployment(
        &self,
        skill: &SkillRecord,
        tool: Tool,
        project_id: Option<&str>,
        path: &str,
        checksum: Option<&str>,
    ) -> Result<String> {
        let now = now_rfc3339();
        let record = DeploymentRecord {
            id: Uuid::new_v4().to_string(),
            skill_id: skill.id.clone(),
            project_id: project_id.map(ToString::to_string),
            tool,
            path: path.to_string(),
            checksum: checksum.map(ToString::to_string),
            status: DeploymentStatus::Synced,
            last_synced_at: Some(now.clone()),
            created_at: now.clone(),
            updated_at: now,
        };
        self.db.upsert_deployment(&record)?;

        // The upsert may have updated an existing row instead of inserting;
        // resolve the id actually stored for this target.
        let stored = self
            .db
            .find_deployment_by_path(path)?
            .map_or(record.id, |d| d.id);
        Ok(stored)
    }

    /// Remove a deployment's files and record together. If the filesystem
    /// removal fails the record is kept, avoiding ghost state where the
    /// database says gone but the disk still has files.
    pub fn delete_deployment(&self, deployment_id: &str) -> Result<()> {
        let _guard = self.locks.try_acquire(deployment_id)?;
        let dep = self.db.require_deployment(deployment_id)?;

        if let Err(err) = remove_tree(Path::new(&dep.path)) {
            self.record_history(
                Some(&dep.skill_id),
                Some(&dep.id),
                SyncAction::Delete,
                dep.checksum.as_deref(),
                None,
                Some(&err.to_string()),
            );
            return Err(err);
        }

        self.db.delete_deployment(&dep.id)?;
        self.record_history(
            Some(&dep.skill_id),
            Some(&dep.id),
            SyncAction::Delete,
            dep.checksum.as_deref(),
            None,
            None,
        );
        info!(deployment = %dep.id, path = %dep.path, "deployment deleted");
        Ok(())
    }

    /// Restore the library from a backup. The current library is itself
    /// snapshotted first so restores are reversible.
    pub fn restore_from_backup(&self, backup_id: &str, also_sync: bool) -> Result<RestoreOutcome> {
        let backup = self.db.require_backup(backup_id)?;
        let skill = self.db.require_skill(&backup.skill_id)?;

        let tree = self.backups.load(&backup)?;

        self.backups.create(&skill, BackupReason::PreRestore)?;

        write_replacing(Path::new(&skill.local_path), &tree)?;
        let new_checksum = checksum_tree(&tree).map(crate::core::Checksum::into_string);
        self.db
            .update_skill_checksum(&skill.id, new_checksum.as_deref())?;

        self.record_history(
            Some(&skill.id),
            None,
            SyncAction::Restore,
            skill.checksum.as_deref(),
            new_checksum.as_deref(),
            None,
        );

        let mut deployments_synced = 0usize;
        if also_sync {
            for dep in self.db.list_deployments_for_skill(&skill.id)? {
                match self.sync_deployment(&dep.id) {
                    Ok(_) => deployments_synced += 1,
                    Err(err) => {
                        warn!(deployment = %dep.id, error = %err, "post-restore sync failed");
                    }
                }
            }
        }

        info!(skill = %skill.name, backup = %backup.id, "library restored from backup");
        Ok(RestoreOutcome {
            skill_id: skill.id,
            restored_version: backup.version_label,
            new_checksum,
            deployments_synced,
        })
    }

    /// Append a history row; failures here are logged, never propagated,
    /// so audit trouble cannot mask the primary result.
    fn record_history(
        &self,
        skill_id: Option<&str>,
        deployment_id: Option<&str>,
        action: SyncAction,
        from_checksum: Option<&str>,
        to_checksum: Option<&str>,
        error_message: Option<&str>,
    ) {
        let entry = SyncHistoryRecord {
            id: Uuid::new_v4().to_string(),
            skill_id: skill_id.map(ToString::to_string),
            deployment_id: deployment_id.map(ToString::to_string),
            action,
            from_checksum: from_checksum.map(ToString::to_string),
            to_checksum: to_checksum.map(ToString::to_string),
            status: if error_message.is_none() {
                "success".to_string()
            } else {
                "failed".to_string()
            },
            error_message: error_message.map(ToString::to_string),
            created_at: now_rfc3339(),
        };
        if let Err(err) = self.db.insert_history(&entry) {
            warn!(error = %err, "failed to record sync history");
        }
    }
}

/// Clear `target` and write `tree`, failing on any per-file error.
fn write_replacing(target: &Path, tree: &crate::core::FileTree) -> Result<usize> {
    remove_tree(target)?;
    let outcome = write_tree(target, tree)?;
    if let Some(first) = outcome.failures.first() {
        return Err(SyncError::Validation(format!(
            "write to {} failed at {}: {}",
            target.display(),
            first.path,
            first.error
        )));
    }
    Ok(outcome.files_written)
}
