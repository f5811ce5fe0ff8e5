//! Backup snapshots of library content.
//!
//! Every action that overwrites library content snapshots it first; the
//! snapshot lives under `<backup_root>/<skill_name>/<timestamp>` and is
//! never deleted by the core.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::checksum::checksum_tree;
use crate::core::models::{BackupRecord, BackupReason, SkillRecord};
use crate::error::{Result, SyncError};
use crate::storage::Database;
use crate::utils::fs::{read_tree, write_tree};
use crate::utils::{now_rfc3339, timestamp_label};

/// Creates and restores file-tree snapshots of a skill's library content.
#[derive(Debug, Clone)]
pub struct BackupStore {
    db: Arc<Database>,
    backup_root: PathBuf,
}

impl BackupStore {
    pub const fn new(db: Arc<Database>, backup_root: PathBuf) -> Self {
        Self { db, backup_root }
    }

    /// Snapshot the skill's current library content.
    ///
    /// Returns `None` when the library directory does not exist yet (a
    /// fresh skill with nothing to protect).
    pub fn create(&self, skill: &SkillRecord, reason: BackupReason) -> Result<Option<BackupRecord>> {
        let library_dir = Path::new(&skill.local_path);
        if !library_dir.exists() {
            return Ok(None);
        }

        let tree = read_tree(library_dir)?;
        let label = timestamp_label();
        let backup_dir = self.backup_root.join(&skill.name).join(&label);

        let outcome = write_tree(&backup_dir, &tree)?;
        if let Some(first) = outcome.failures.first() {
            return Err(SyncError::Validation(format!(
                "backup of {} failed at {}: {}",
                skill.name, first.path, first.error
            )));
        }

        let record = BackupRecord {
            id: Uuid::new_v4().to_string(),
            skill_id: skill.id.clone(),
            version_label: Some(label),
            backup_path: backup_dir.to_string_lossy().to_string(),
            checksum: checksum_tree(&tree).map(crate::core::Checksum::into_string),
            reason,
            created_at: now_rfc3339(),
        };
        self.db.insert_backup(&record)?;

        info!(
            skill = %skill.name,
            backup_id = %record.id,
            reason = reason.as_str(),
            "library backed up"
        );
        Ok(Some(record))
    }

    /// Load the file tree stored in a backup.
    pub fn load(&self, backup: &BackupRecord) -> Result<crate::core::FileTree> {
        let dir = Path::new(&backup.backup_path);
        if !dir.exists() {
            return Err(SyncError::PathUnavailable {
                path: dir.to_path_buf(),
            });
        }
        read_tree(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_skill;

    fn store_with_skill(tmp: &Path) -> (BackupStore, SkillRecord) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut skill = sample_skill("s1", "demo");
        let lib = tmp.join("library/demo");
        std::fs::create_dir_all(&lib).unwrap();
        std::fs::write(lib.join("SKILL.md"), b"v1").unwrap();
        skill.local_path = lib.to_string_lossy().to_string();
        db.insert_skill(&skill).unwrap();
        (BackupStore::new(db, tmp.join("backups")), skill)
    }

    #[test]
    fn create_snapshots_library_content() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, skill) = store_with_skill(tmp.path());

        let backup = store
            .create(&skill, BackupReason::PreUpdate)
            .unwrap()
            .unwrap();
        assert_eq!(backup.reason, BackupReason::PreUpdate);
        assert!(backup.checksum.is_some());

        let tree = store.load(&backup).unwrap();
        assert_eq!(tree.get("SKILL.md").unwrap(), b"v1");
    }

    #[test]
    fn create_without_library_dir_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let skill = sample_skill("s1", "ghost");
        let store = BackupStore::new(db, tmp.path().join("backups"));
        assert!(store.create(&skill, BackupReason::Manual).unwrap().is_none());
    }

    #[test]
    fn load_missing_backup_dir_is_path_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, skill) = store_with_skill(tmp.path());
        let mut backup = store
            .create(&skill, BackupReason::Manual)
            .unwrap()
            .unwrap();
        backup.backup_path = tmp.path().join("gone").to_string_lossy().to_string();
        assert!(matches!(
            store.load(&backup).unwrap_err(),
            SyncError::PathUnavailable { .. }
        ));
    }
}
