//! Sync action execution: directional copies, backups, watcher protocol.

pub mod actions;
pub mod backups;
pub mod locks;
pub mod watcher;

pub use actions::{ConflictInfo, ConflictStatus, SyncExecutor};
pub use backups::BackupStore;
pub use locks::DeploymentLocks;
pub use watcher::{AbsorbOutcome, WatcherSync};
