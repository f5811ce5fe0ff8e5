//! Shared fixtures for unit and integration tests.

use crate::core::models::{DeploymentRecord, DeploymentStatus, SkillRecord, SkillSource};
use crate::tools::Tool;
use crate::utils::now_rfc3339;

/// A minimal local skill record.
#[must_use]
pub fn sample_skill(id: &str, name: &str) -> SkillRecord {
    let now = now_rfc3339();
    SkillRecord {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(format!("{name} test skill")),
        version: Some("1.0.0".to_string()),
        source: SkillSource::Local,
        source_url: None,
        checksum: None,
        local_path: format!("/library/{name}"),
        last_modified_at: None,
        created_at: now.clone(),
        updated_at: now,
        watcher_modified_at: None,
        watcher_backup_id: None,
        watcher_trigger_dep_id: None,
    }
}

/// A minimal pending global deployment.
#[must_use]
pub fn sample_deployment(id: &str, skill_id: &str, tool: Tool, path: &str) -> DeploymentRecord {
    let now = now_rfc3339();
    DeploymentRecord {
        id: id.to_string(),
        skill_id: skill_id.to_string(),
        project_id: None,
        tool,
        path: path.to_string(),
        checksum: None,
        status: DeploymentStatus::Pending,
        last_synced_at: None,
        created_at: now.clone(),
        updated_at: now,
    }
}
