//! Application context shared by every CLI command.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::reconcile::Reconciler;
use crate::scanner::ScanImporter;
use crate::storage::{Database, GlobalLock};
use crate::sync::{BackupStore, DeploymentLocks, SyncExecutor, WatcherSync};
use crate::updater::{HttpCatalog, UpdateChecker};

/// Shared handles: configuration, database, lock tables.
pub struct AppContext {
    pub root: PathBuf,
    pub home: PathBuf,
    pub config: Config,
    pub db: Arc<Database>,
    pub locks: Arc<DeploymentLocks>,
    /// Machine-readable output requested.
    pub json: bool,
    _global_lock: GlobalLock,
}

impl AppContext {
    /// Build the context from parsed CLI flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| SyncError::Config("home directory not found".to_string()))?;

        let root = cli
            .root
            .clone()
            .or_else(|| std::env::var("SKILLSYNC_ROOT").ok().map(PathBuf::from))
            .unwrap_or_else(|| home.join(".skillsync"));

        let config = Config::load(cli.config.as_deref(), &root)?;
        let global_lock = GlobalLock::acquire(&root)?;
        let db = Arc::new(Database::open(root.join("skillsync.db"))?);

        Ok(Self {
            root,
            home,
            config,
            db,
            locks: Arc::new(DeploymentLocks::new()),
            json: cli.json,
            _global_lock: global_lock,
        })
    }

    #[must_use]
    pub fn library_root(&self) -> PathBuf {
        self.config.library_root(&self.root)
    }

    #[must_use]
    pub fn backup_root(&self) -> PathBuf {
        self.config.backup_root(&self.root)
    }

    #[must_use]
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.db.clone(),
            self.locks.clone(),
            self.home.clone(),
            self.config.scan.file_timeout,
        )
    }

    #[must_use]
    pub fn backups(&self) -> BackupStore {
        BackupStore::new(self.db.clone(), self.backup_root())
    }

    #[must_use]
    pub fn executor(&self) -> SyncExecutor {
        SyncExecutor::new(
            self.db.clone(),
            self.locks.clone(),
            self.backups(),
            self.home.clone(),
        )
    }

    #[must_use]
    pub fn watcher(&self) -> WatcherSync {
        WatcherSync::new(self.db.clone(), self.locks.clone(), self.backups())
    }

    #[must_use]
    pub fn importer(&self) -> ScanImporter {
        ScanImporter::new(self.db.clone(), self.library_root())
    }

    pub fn update_checker(&self) -> Result<UpdateChecker<HttpCatalog>> {
        let token = std::env::var(&self.config.remote.token_env).ok();
        let catalog = HttpCatalog::new(
            &self.config.remote.api_base,
            token,
            self.config.remote.request_timeout,
        )?;
        Ok(UpdateChecker::new(self.db.clone(), catalog))
    }
}
