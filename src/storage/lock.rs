//! Advisory file lock making one process the owner of the sync root.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SyncError};

/// Exclusive advisory lock over the application root.
///
/// The reconciliation state machine has a single logical owner per
/// instance; a second `sks` process blocks here until the first exits.
pub struct GlobalLock {
    #[allow(dead_code)]
    lock_file: File,
    #[allow(dead_code)]
    lock_path: PathBuf,
}

#[derive(Serialize)]
struct LockHolder {
    pid: u32,
    acquired_at: String,
}

impl GlobalLock {
    const LOCK_FILENAME: &'static str = "skillsync.lock";

    /// Acquire the exclusive lock (blocking).
    pub fn acquire(root: &Path) -> Result<Self> {
        let lock_path = root.join(Self::LOCK_FILENAME);
        std::fs::create_dir_all(root)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| SyncError::Config(format!("open lock file: {e}")))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| SyncError::Config(format!("acquire exclusive lock: {e}")))?;

        let holder = LockHolder {
            pid: std::process::id(),
            acquired_at: crate::utils::now_rfc3339(),
        };
        let holder_json = serde_json::to_string(&holder).unwrap_or_default();
        std::fs::write(&lock_path, holder_json).ok();

        debug!("Acquired global lock at {:?}", lock_path);
        Ok(Self {
            lock_file,
            lock_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_lock_file() {
        let tmp = tempfile::tempdir().unwrap();
        let _lock = GlobalLock::acquire(tmp.path()).unwrap();
        assert!(tmp.path().join("skillsync.lock").exists());
    }

    #[test]
    fn reacquire_after_drop() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let _lock = GlobalLock::acquire(tmp.path()).unwrap();
        }
        let _lock = GlobalLock::acquire(tmp.path()).unwrap();
    }
}
