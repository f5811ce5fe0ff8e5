//! Watcher absorption protocol.
//!
//! When the external watcher reports a change under a deployment path, the
//! library is not overwritten blindly: the current library content is
//! backed up first, the change is absorbed, and the skill is flagged so
//! the operator decides whether to propagate it everywhere. A second
//! change arriving while one is pending coalesces into the same pending
//! state and keeps the original backup — the recovery point is never
//! overwritten.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::checksum::checksum_tree;
use crate::core::models::{
    BackupReason, ChangeEventRecord, ChangeEventType, EventResolution,
};
use crate::error::{Result, SyncError};
use crate::storage::Database;
use crate::sync::actions::SyncExecutor;
use crate::sync::backups::BackupStore;
use crate::sync::locks::DeploymentLocks;
use crate::utils::fs::{read_tree, remove_tree, write_tree};
use crate::utils::now_rfc3339;

/// What an absorption call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AbsorbOutcome {
    /// Deployment content already matches the library.
    Unchanged,
    /// Change absorbed into the library, pending operator resolution.
    Absorbed {
        backup_id: Option<String>,
        /// True when an earlier absorption was still pending and this
        /// change folded into it.
        coalesced: bool,
    },
}

/// Handles watcher notifications and the three resolution actions.
pub struct WatcherSync {
    db: Arc<Database>,
    locks: Arc<DeploymentLocks>,
    backups: BackupStore,
}

impl WatcherSync {
    pub const fn new(db: Arc<Database>, locks: Arc<DeploymentLocks>, backups: BackupStore) -> Self {
        Self { db, locks, backups }
    }

    /// Absorb an external change detected on a deployment.
    pub fn absorb_change(&self, deployment_id: &str) -> Result<AbsorbOutcome> {
        let _guard = self.locks.try_acquire(deployment_id)?;

        let dep = self.db.require_deployment(deployment_id)?;
        let skill = self.db.require_skill(&dep.skill_id)?;

        let deploy_dir = Path::new(&dep.path);
        if !deploy_dir.exists() {
            return Err(SyncError::PathUnavailable {
                path: deploy_dir.to_path_buf(),
            });
        }

        let tree = read_tree(deploy_dir)?;
        let new_checksum = checksum_tree(&tree).map(crate::core::Checksum::into_string);

        if new_checksum == skill.checksum {
            // False alarm (e.g. touch without content change).
            self.db
                .mark_deployment_synced(&dep.id, new_checksum.as_deref())?;
            return Ok(AbsorbOutcome::Unchanged);
        }

        let (backup_id, coalesced) = if skill.watcher_pending() {
            // Coalesce: keep the original pending backup as the recovery
            // point, only refresh the absorbed content and trigger.
            (skill.watcher_backup_id.clone(), true)
        } else {
            let backup = self.backups.create(&skill, BackupReason::PreUpdate)?;
            (backup.map(|b| b.id), false)
        };

        // Absorb the deployment content into the library.
        remove_tree(Path::new(&skill.local_path))?;
        let outcome = write_tree(Path::new(&skill.local_path), &tree)?;
        if let Some(first) = outcome.failures.first() {
            return Err(SyncError::Validation(format!(
                "absorb into {} failed at {}: {}",
                skill.local_path, first.path, first.error
            )));
        }

        self.db
            .update_skill_checksum(&skill.id, new_checksum.as_deref())?;
        self.db
            .set_watcher_pending(&skill.id, backup_id.as_deref(), &dep.id)?;
        // The trigger deployment now equals the library; its siblings are
        // left untouched and will reconcile as diverged.
        self.db
            .mark_deployment_synced(&dep.id, new_checksum.as_deref())?;

        self.db.insert_change_event(&ChangeEventRecord {
            id: Uuid::new_v4().to_string(),
            deployment_id: dep.id.clone(),
            event_type: ChangeEventType::Modified,
            old_checksum: skill.checksum.clone(),
            new_checksum,
            resolution: EventResolution::Pending,
            resolved_at: None,
            created_at: now_rfc3339(),
        })?;

        info!(
            skill = %skill.name,
            deployment = %dep.id,
            coalesced,
            "watcher change absorbed into library"
        );
        Ok(AbsorbOutcome::Absorbed {
            backup_id,
            coalesced,
        })
    }

    /// Resolution: push the absorbed library content to every other
    /// deployment, then clear the pending flag.
    pub fn full_sync(&self, skill_id: &str, executor: &SyncExecutor) -> Result<usize> {
        let skill = self.db.require_skill(skill_id)?;
        if !skill.watcher_pending() {
            return Err(SyncError::WatcherNotPending(skill_id.to_string()));
        }
        let trigger = skill.watcher_trigger_dep_id.clone().unwrap_or_default();

        self.db.clear_watcher_pending(skill_id)?;
        let synced = executor.sync_other_deployments(skill_id, &trigger)?;

        info!(skill = %skill.name, synced, "watcher change fully synced");
        Ok(synced)
    }

    /// Resolution: accept the absorbed library state without touching the
    /// other deployments (they stay diverged for later handling).
    pub fn db_only(&self, skill_id: &str) -> Result<()> {
        let skill = self.db.require_skill(skill_id)?;
        if !skill.watcher_pending() {
            return Err(SyncError::WatcherNotPending(skill_id.to_string()));
        }
        self.db.clear_watcher_pending(skill_id)?;
        info!(skill = %skill.name, "watcher change accepted without propagation");
        Ok(())
    }

    /// Resolution: restore the library from the pending backup, push the
    /// restored content back to the trigger deployment only, clear flags.
    ///
    /// Hard-fails with `NoBackupAvailable` when no backup was recorded —
    /// proceeding would lose the only copy of the pre-change content.
    pub fn discard(&self, skill_id: &str, executor: &SyncExecutor) -> Result<()> {
        let skill = self.db.require_skill(skill_id)?;
        if !skill.watcher_pending() {
            return Err(SyncError::WatcherNotPending(skill_id.to_string()));
        }

        let backup_id = skill
            .watcher_backup_id
            .clone()
            .ok_or_else(|| SyncError::NoBackupAvailable(skill_id.to_string()))?;
        let backup = self.db.require_backup(&backup_id)?;

        let tree = self.backups.load(&backup)?;
        remove_tree(Path::new(&skill.local_path))?;
        let outcome = write_tree(Path::new(&skill.local_path), &tree)?;
        if let Some(first) = outcome.failures.first() {
            return Err(SyncError::Validation(format!(
                "restore into {} failed at {}: {}",
                skill.local_path, first.path, first.error
            )));
        }
        let restored_checksum = checksum_tree(&tree).map(crate::core::Checksum::into_string);
        self.db
            .update_skill_checksum(&skill.id, restored_checksum.as_deref())?;

        // Push the old content back to the deployment that triggered the
        // absorption, so its directory also returns to the pre-change state.
        if let Some(trigger_id) = &skill.watcher_trigger_dep_id {
            match executor.sync_deployment(trigger_id) {
                Ok(_) => {}
                Err(err) => {
                    warn!(deployment = %trigger_id, error = %err, "push-back to trigger failed");
                }
            }
        }

        self.db.clear_watcher_pending(skill_id)?;
        info!(skill = %skill.name, backup = %backup_id, "watcher change discarded and restored");
        Ok(())
    }

}
