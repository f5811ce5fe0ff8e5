//! Per-deployment mutual exclusion.
//!
//! At most one reconcile, sync, or merge operation may be in flight per
//! deployment id; a concurrent request fails fast with [`SyncError::Busy`]
//! instead of racing.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::error::{Result, SyncError};

/// In-flight deployment lock table.
#[derive(Debug, Default)]
pub struct DeploymentLocks {
    inflight: Mutex<HashSet<String>>,
}

impl DeploymentLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the lock for one deployment.
    pub fn try_acquire(&self, deployment_id: &str) -> Result<DeploymentGuard<'_>> {
        let mut inflight = self.inflight.lock();
        if !inflight.insert(deployment_id.to_string()) {
            return Err(SyncError::Busy(deployment_id.to_string()));
        }
        Ok(DeploymentGuard {
            locks: self,
            deployment_id: deployment_id.to_string(),
        })
    }

    fn release(&self, deployment_id: &str) {
        self.inflight.lock().remove(deployment_id);
    }
}

/// Releases the deployment lock on drop.
#[must_use]
#[derive(Debug)]
pub struct DeploymentGuard<'a> {
    locks: &'a DeploymentLocks,
    deployment_id: String,
}

impl Drop for DeploymentGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.deployment_id);
    }
}
