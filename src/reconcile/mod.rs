//! Consistency reconciliation.
//!
//! For every tracked deployment: one read→compute→compare→persist pass
//! against the library checksum, emitting change events on status
//! transitions. Separately scans tool directory conventions for skill
//! folders with no deployment record.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::checksum::checksum_dir;
use crate::core::models::{
    ChangeEventRecord, ChangeEventType, DeploymentRecord, DeploymentStatus, EventResolution,
};
use crate::error::{Result, SyncError};
use crate::storage::Database;
use crate::sync::locks::DeploymentLocks;
use crate::tools::Tool;
use crate::utils::fs::list_subdirs;
use crate::utils::now_rfc3339;

/// Per-deployment reconciliation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyDetail {
    pub deployment_id: String,
    pub skill_id: String,
    pub skill_name: String,
    pub tool: Tool,
    pub deploy_path: String,
    pub status: DeploymentStatus,
    pub library_checksum: Option<String>,
    pub deployed_checksum: Option<String>,
}

/// A skill folder on disk with no deployment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UntrackedSkill {
    pub name: String,
    pub tool: Tool,
    pub project_id: Option<String>,
    pub path: String,
    pub checksum: Option<String>,
}

/// Aggregate of a full reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub total_deployments: usize,
    pub synced: usize,
    pub diverged: usize,
    pub missing: usize,
    pub untracked: Vec<UntrackedSkill>,
    pub details: Vec<ConsistencyDetail>,
    /// Per-deployment failures; one bad path never aborts the batch.
    pub errors: Vec<String>,
}

/// The central correctness engine.
pub struct Reconciler {
    db: std::sync::Arc<Database>,
    locks: std::sync::Arc<DeploymentLocks>,
    home: PathBuf,
    file_timeout: Duration,
}

impl Reconciler {
    pub const fn new(
        db: std::sync::Arc<Database>,
        locks: std::sync::Arc<DeploymentLocks>,
        home: PathBuf,
        file_timeout: Duration,
    ) -> Self {
        Self {
            db,
            locks,
            home,
            file_timeout,
        }
    }

    /// Reconcile every tracked deployment and scan for untracked skills.
    pub fn reconcile_all(&self) -> Result<ConsistencyReport> {
        let deployments = self.db.list_deployments()?;
        let mut report = ConsistencyReport {
            total_deployments: deployments.len(),
            ..Default::default()
        };

        for dep in &deployments {
            match self.reconcile_one(&dep.id) {
                Ok(detail) => {
                    match detail.status {
                        DeploymentStatus::Synced => report.synced += 1,
                        DeploymentStatus::Diverged => report.diverged += 1,
                        DeploymentStatus::Missing => report.missing += 1,
                        DeploymentStatus::Untracked | DeploymentStatus::Pending => {}
                    }
                    report.details.push(detail);
                }
                Err(err) => {
                    warn!(deployment = %dep.id, error = %err, "reconcile failed");
                    report.errors.push(format!("{}: {err}", dep.id));
                }
            }
        }

        report.untracked = self.scan_untracked(&deployments)?;

        info!(
            total = report.total_deployments,
            synced = report.synced,
            diverged = report.diverged,
            missing = report.missing,
            untracked = report.untracked.len(),
            "reconciliation complete"
        );
        Ok(report)
    }

    /// Reconcile a single deployment. Idempotent: with no intervening
    /// filesystem change, repeated calls produce the same detail.
    pub fn reconcile_one(&self, deployment_id: &str) -> Result<ConsistencyDetail> {
        let _guard = self.locks.try_acquire(deployment_id)?;

        let dep = self.db.require_deployment(deployment_id)?;
        let skill = self.db.require_skill(&dep.skill_id)?;

        // Single consistent read pass: the deployed checksum is computed
        // once and every decision below uses that snapshot.
        let deploy_dir = Path::new(&dep.path);
        let deployed_checksum = if deploy_dir.exists() {
            self.bounded_checksum(deploy_dir)?
        } else {
            None
        };

        let status = if !deploy_dir.exists() {
            DeploymentStatus::Missing
        } else if deployed_checksum == skill.checksum {
            DeploymentStatus::Synced
        } else {
            DeploymentStatus::Diverged
        };

        if status != dep.status {
            self.db.set_deployment_status(&dep.id, status)?;
            self.emit_transition_event(&dep, status, deployed_checksum.as_deref())?;
        }

        Ok(ConsistencyDetail {
            deployment_id: dep.id,
            skill_id: skill.id,
            skill_name: skill.name,
            tool: dep.tool,
            deploy_path: dep.path,
            status,
            library_checksum: skill.checksum,
            deployed_checksum,
        })
    }

    fn emit_transition_event(
        &self,
        dep: &DeploymentRecord,
        status: DeploymentStatus,
        observed_checksum: Option<&str>,
    ) -> Result<()> {
        let event_type = match status {
            DeploymentStatus::Diverged => ChangeEventType::ChecksumMismatch,
            DeploymentStatus::Missing => ChangeEventType::Deleted,
            _ => return Ok(()),
        };
        self.db.insert_change_event(&ChangeEventRecord {
            id: Uuid::new_v4().to_string(),
            deployment_id: dep.id.clone(),
            event_type,
            old_checksum: dep.checksum.clone(),
            new_checksum: observed_checksum.map(ToString::to_string),
            resolution: EventResolution::Pending,
            resolved_at: None,
            created_at: now_rfc3339(),
        })?;
        Ok(())
    }

    /// Walk each tool convention (per registered project and globally) for
    /// skill folders with no deployment record.
    fn scan_untracked(&self, deployments: &[DeploymentRecord]) -> Result<Vec<UntrackedSkill>> {
        let tracked: HashSet<&str> = deployments.iter().map(|d| d.path.as_str()).collect();
        let mut seen = HashSet::new();
        let mut untracked = Vec::new();

        let projects = self.db.list_projects()?;
        for project in &projects {
            for tool in Tool::ALL {
                let base = Path::new(&project.path).join(tool.project_dir());
                self.collect_untracked(
                    &base,
                    *tool,
                    Some(project.id.as_str()),
                    &tracked,
                    &mut seen,
                    &mut untracked,
                )?;
            }
        }
        for tool in Tool::ALL {
            let base = self.home.join(tool.global_dir());
            self.collect_untracked(&base, *tool, None, &tracked, &mut seen, &mut untracked)?;
        }

        Ok(untracked)
    }

    fn collect_untracked(
        &self,
        base: &Path,
        tool: Tool,
        project_id: Option<&str>,
        tracked: &HashSet<&str>,
        seen: &mut HashSet<String>,
        out: &mut Vec<UntrackedSkill>,
    ) -> Result<()> {
        for dir in list_subdirs(base)? {
            let path = dir.to_string_lossy().to_string();
            if tracked.contains(path.as_str()) || !seen.insert(path.clone()) {
                continue;
            }
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let checksum = checksum_dir(&dir)?.map(crate::core::Checksum::into_string);

            self.emit_untracked_event(&path, checksum.as_deref())?;
            out.push(UntrackedSkill {
                name,
                tool,
                project_id: project_id.map(ToString::to_string),
                path,
                checksum,
            });
        }
        Ok(())
    }

    /// One pending `untracked_skill` event per path; rescans do not spam
    /// duplicates while the first is unresolved.
    fn emit_untracked_event(&self, path: &str, checksum: Option<&str>) -> Result<()> {
        let pending = self.db.list_change_events(Some(EventResolution::Pending))?;
        if pending
            .iter()
            .any(|e| e.event_type == ChangeEventType::UntrackedSkill && e.deployment_id == path)
        {
            return Ok(());
        }
        self.db.insert_change_event(&ChangeEventRecord {
            id: Uuid::new_v4().to_string(),
            // Untracked folders have no deployment yet; the path stands in
            // as the reference.
            deployment_id: path.to_string(),
            event_type: ChangeEventType::UntrackedSkill,
            old_checksum: None,
            new_checksum: checksum.map(ToString::to_string),
            resolution: EventResolution::Pending,
            resolved_at: None,
            created_at: now_rfc3339(),
        })?;
        Ok(())
    }

    /// Checksum a directory with a wall-clock bound, protecting the pass
    /// against unreachable network-mounted paths.
    fn bounded_checksum(&self, dir: &Path) -> Result<Option<String>> {
        let (tx, rx) = mpsc::channel();
        let dir_owned = dir.to_path_buf();
        std::thread::spawn(move || {
            let result = checksum_dir(&dir_owned);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.file_timeout) {
            Ok(result) => Ok(result?.map(crate::core::Checksum::into_string)),
            Err(_) => Err(SyncError::Timeout(format!(
                "checksum of {} exceeded {:?}",
                dir.display(),
                self.file_timeout
            ))),
        }
    }
}
