//! Remote update checking.
//!
//! A separate, independently-failing pass from local reconciliation:
//! network trouble here never blocks checksum work on local deployments.

pub mod catalog;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

pub use catalog::{CatalogClient, HttpCatalog, RemoteEntry};

use crate::core::models::{SkillRecord, SkillSourceRecord};
use crate::error::Result;
use crate::storage::Database;

/// Update status of one remotely-sourced skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteUpdateInfo {
    pub skill_id: String,
    pub skill_name: String,
    pub current_version: Option<String>,
    pub owner_repo: String,
    pub remote_path: String,
    /// Remote folder SHA recorded at install time.
    pub local_sha: Option<String>,
    /// Remote folder SHA observed now.
    pub remote_sha: String,
    /// The remote moved since install.
    pub has_update: bool,
    /// The library moved since install; updating overwrites local edits
    /// and requires `force`.
    pub locally_modified: bool,
    pub deploy_count: usize,
}

/// A skill paired with its install-time provenance.
#[derive(Debug, Clone)]
pub struct SkillWithSource {
    pub skill: SkillRecord,
    pub source: SkillSourceRecord,
    pub deploy_count: usize,
}

/// Repository tree snapshots keyed by `owner/repo`.
pub type RemoteSnapshot = HashMap<String, Vec<RemoteEntry>>;

/// Pure comparison of local provenance against a remote snapshot.
///
/// Identity is `(owner_repo, remote_path)`; skills whose folder is absent
/// from the snapshot are skipped (deleted upstream is not an update).
#[must_use]
pub fn check_updates(skills: &[SkillWithSource], snapshot: &RemoteSnapshot) -> Vec<RemoteUpdateInfo> {
    let mut results = Vec::new();

    for entry in skills {
        let (Some(owner_repo), Some(remote_path)) = (
            entry.source.owner_repo.as_deref(),
            entry.source.remote_path.as_deref(),
        ) else {
            continue;
        };
        let Some(tree) = snapshot.get(owner_repo) else {
            continue;
        };
        let Some(latest) = tree
            .iter()
            .find(|e| e.is_tree() && e.path == remote_path)
            .map(|e| e.sha.clone())
        else {
            continue;
        };

        let has_update = entry
            .source
            .remote_sha
            .as_ref()
            .is_none_or(|recorded| recorded != &latest);

        let locally_modified = match (&entry.skill.checksum, &entry.source.original_checksum) {
            (Some(current), Some(original)) => current != original,
            _ => false,
        };

        results.push(RemoteUpdateInfo {
            skill_id: entry.skill.id.clone(),
            skill_name: entry.skill.name.clone(),
            current_version: entry.skill.version.clone(),
            owner_repo: owner_repo.to_string(),
            remote_path: remote_path.to_string(),
            local_sha: entry.source.remote_sha.clone(),
            remote_sha: latest,
            has_update,
            locally_modified,
            deploy_count: entry.deploy_count,
        });
    }

    results
}

/// Gathers remote-sourced skills and runs the check against live trees.
pub struct UpdateChecker<C: CatalogClient> {
    db: Arc<Database>,
    client: C,
}

impl<C: CatalogClient> UpdateChecker<C> {
    pub const fn new(db: Arc<Database>, client: C) -> Self {
        Self { db, client }
    }

    pub fn run(&self) -> Result<Vec<RemoteUpdateInfo>> {
        let candidates = self.remote_sourced_skills()?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut repos: Vec<&str> = candidates
            .iter()
            .filter_map(|c| c.source.owner_repo.as_deref())
            .collect();
        repos.sort_unstable();
        repos.dedup();

        // One tree request per repo; a failing repo is skipped, not fatal.
        let mut snapshot = RemoteSnapshot::new();
        for repo in repos {
            match self.client.fetch_repo_tree(repo) {
                Ok(tree) => {
                    snapshot.insert(repo.to_string(), tree);
                }
                Err(err) => {
                    warn!(repo, error = %err, "repo tree fetch failed");
                }
            }
        }

        let results = check_updates(&candidates, &snapshot);
        info!(
            checked = results.len(),
            updates = results.iter().filter(|r| r.has_update).count(),
            "remote update check complete"
        );
        Ok(results)
    }

    fn remote_sourced_skills(&self) -> Result<Vec<SkillWithSource>> {
        let mut out = Vec::new();
        for skill in self.db.list_skills()? {
            if !skill.source.is_remote() {
                continue;
            }
            let Some(source) = self.db.get_skill_source(&skill.id)? else {
                continue;
            };
            let deploy_count = self.db.list_deployments_for_skill(&skill.id)?.len();
            out.push(SkillWithSource {
                skill,
                source,
                deploy_count,
            });
        }
        Ok(out)
    }
}
