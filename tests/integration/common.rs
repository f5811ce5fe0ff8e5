//! Shared fixture: a library skill with deployments on temp directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use skillsync::core::checksum::checksum_dir;
use skillsync::core::models::DeploymentStatus;
use skillsync::reconcile::Reconciler;
use skillsync::storage::Database;
use skillsync::sync::{BackupStore, DeploymentLocks, SyncExecutor, WatcherSync};
use skillsync::test_support::{sample_deployment, sample_skill};
use skillsync::tools::Tool;

pub struct World {
    pub tmp: tempfile::TempDir,
    pub db: Arc<Database>,
    pub locks: Arc<DeploymentLocks>,
    pub library: PathBuf,
}

impl World {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let locks = Arc::new(DeploymentLocks::new());

        let library = tmp.path().join("library/frontend-design");
        std::fs::create_dir_all(&library).unwrap();
        std::fs::write(library.join("SKILL.md"), b"v1 guidance\n").unwrap();

        let mut skill = sample_skill("skill-1", "frontend-design");
        skill.local_path = library.to_string_lossy().to_string();
        skill.checksum = checksum(&library);
        db.insert_skill(&skill).unwrap();

        Self {
            tmp,
            db,
            locks,
            library,
        }
    }

    /// Add a synced deployment whose directory mirrors the library.
    pub fn add_deployment(&self, id: &str, tool: Tool, rel: &str) -> PathBuf {
        let path = self.tmp.path().join(rel);
        std::fs::create_dir_all(&path).unwrap();
        for entry in std::fs::read_dir(&self.library).unwrap() {
            let entry = entry.unwrap();
            std::fs::copy(entry.path(), path.join(entry.file_name())).unwrap();
        }

        let mut dep = sample_deployment(id, "skill-1", tool, &path.to_string_lossy());
        dep.checksum = checksum(&path);
        dep.status = DeploymentStatus::Synced;
        self.db.upsert_deployment(&dep).unwrap();
        path
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.db.clone(),
            self.locks.clone(),
            self.tmp.path().join("home"),
            Duration::from_secs(5),
        )
    }

    pub fn executor(&self) -> SyncExecutor {
        SyncExecutor::new(
            self.db.clone(),
            self.locks.clone(),
            self.backups(),
            self.tmp.path().join("home"),
        )
    }

    pub fn watcher(&self) -> WatcherSync {
        WatcherSync::new(self.db.clone(), self.locks.clone(), self.backups())
    }

    pub fn backups(&self) -> BackupStore {
        BackupStore::new(self.db.clone(), self.tmp.path().join("backups"))
    }
}

pub fn checksum(dir: &Path) -> Option<String> {
    checksum_dir(dir)
        .unwrap()
        .map(skillsync::core::Checksum::into_string)
}
