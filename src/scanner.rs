//! Project and global scanning.
//!
//! Discovers pre-existing skill folders under tool directory conventions,
//! reads their SKILL.md frontmatter, and optionally imports them as
//! library skills with tracked deployments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::checksum::checksum_dir;
use crate::core::models::{
    DeploymentRecord, DeploymentStatus, ProjectRecord, SkillRecord, SkillSource,
};
use crate::error::{Result, SyncError};
use crate::storage::Database;
use crate::tools::Tool;
use crate::utils::fs::{list_subdirs, read_tree, write_tree};
use crate::utils::now_rfc3339;

/// Frontmatter fields read from SKILL.md.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillFrontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// One discovered skill folder.
#[derive(Debug, Clone, Serialize)]
pub struct ScannedSkill {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub tool: Tool,
    pub path: String,
}

/// Result of scanning one project root.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub project_path: String,
    pub tools: Vec<Tool>,
    pub skills: Vec<ScannedSkill>,
}

/// Parse the YAML frontmatter block at the top of a SKILL.md.
///
/// Returns the defaults when the document has no frontmatter or the block
/// fails to parse; a malformed header is not worth failing a scan over.
#[must_use]
pub fn parse_frontmatter(content: &str) -> SkillFrontmatter {
    let mut lines = content.lines();
    if lines.next().map(str::trim) != Some("---") {
        return SkillFrontmatter::default();
    }

    let mut block = String::new();
    for line in lines {
        if line.trim() == "---" {
            return serde_yaml::from_str(&block).unwrap_or_default();
        }
        block.push_str(line);
        block.push('\n');
    }
    SkillFrontmatter::default()
}

/// Scan a project root for skill folders under every tool convention.
pub fn scan_project(project_path: &Path) -> Result<ScanResult> {
    if !project_path.exists() {
        return Err(SyncError::PathUnavailable {
            path: project_path.to_path_buf(),
        });
    }

    let mut tools = Vec::new();
    let mut skills = Vec::new();
    let mut seen_paths = std::collections::HashSet::new();

    for tool in Tool::ALL {
        let base = project_path.join(tool.project_dir());
        if !base.exists() {
            continue;
        }
        tools.push(*tool);
        for dir in list_subdirs(&base)? {
            if !seen_paths.insert(dir.clone()) {
                continue;
            }
            skills.push(scan_skill_dir(&dir, *tool));
        }
    }

    Ok(ScanResult {
        project_path: project_path.to_string_lossy().to_string(),
        tools,
        skills,
    })
}

/// Scan the global skill directories under `home`.
pub fn scan_global(home: &Path) -> Result<Vec<ScannedSkill>> {
    let mut skills = Vec::new();
    let mut seen_paths = std::collections::HashSet::new();
    for tool in Tool::ALL {
        let base = home.join(tool.global_dir());
        for dir in list_subdirs(&base)? {
            if !seen_paths.insert(dir.clone()) {
                continue;
            }
            skills.push(scan_skill_dir(&dir, *tool));
        }
    }
    Ok(skills)
}

fn scan_skill_dir(dir: &Path, tool: Tool) -> ScannedSkill {
    let folder_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let frontmatter = std::fs::read_to_string(dir.join("SKILL.md"))
        .map(|content| parse_frontmatter(&content))
        .unwrap_or_default();

    ScannedSkill {
        name: frontmatter.name.unwrap_or(folder_name),
        description: frontmatter.description,
        version: frontmatter.version,
        tool,
        path: dir.to_string_lossy().to_string(),
    }
}

/// Imports scanned skills into the library and tracks their deployments.
pub struct ScanImporter {
    db: Arc<Database>,
    library_root: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub skills_created: usize,
    pub deployments_tracked: usize,
    pub skipped: usize,
}

impl ScanImporter {
    pub const fn new(db: Arc<Database>, library_root: PathBuf) -> Self {
        Self { db, library_root }
    }

    /// Register a project root, reusing an existing registration.
    pub fn register_project(&self, name: &str, path: &Path) -> Result<ProjectRecord> {
        let path_str = path.to_string_lossy().to_string();
        if let Some(existing) = self.db.get_project_by_path(&path_str)? {
            return Ok(existing);
        }
        let now = now_rfc3339();
        let record = ProjectRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            path: path_str,
            created_at: now.clone(),
            updated_at: now,
        };
        self.db.insert_project(&record)?;
        info!(project = %record.name, path = %record.path, "project registered");
        Ok(record)
    }

    /// Import scanned skills: first-seen content becomes the library copy,
    /// each folder becomes a tracked deployment.
    pub fn import(&self, project_id: Option<&str>, skills: &[ScannedSkill]) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for scanned in skills {
            match self.import_one(project_id, scanned) {
                Ok(created) => {
                    if created {
                        summary.skills_created += 1;
                    }
                    summary.deployments_tracked += 1;
                }
                Err(err) => {
                    warn!(skill = %scanned.name, error = %err, "import failed");
                    summary.skipped += 1;
                }
            }
        }
        Ok(summary)
    }

    fn import_one(&self, project_id: Option<&str>, scanned: &ScannedSkill) -> Result<bool> {
        let deploy_dir = Path::new(&scanned.path);
        let deployed_checksum = checksum_dir(deploy_dir)?.map(crate::core::Checksum::into_string);

        let (skill, created) = match self.db.get_skill_by_name(&scanned.name)? {
            Some(existing) => (existing, false),
            None => {
                // First sighting: the deployed content seeds the library.
                let library_dir = self.library_root.join(&scanned.name);
                let tree = read_tree(deploy_dir)?;
                let outcome = write_tree(&library_dir, &tree)?;
                if let Some(first) = outcome.failures.first() {
                    return Err(SyncError::Validation(format!(
                        "library seed for {} failed at {}: {}",
                        scanned.name, first.path, first.error
                    )));
                }

                let now = now_rfc3339();
                let record = SkillRecord {
                    id: Uuid::new_v4().to_string(),
                    name: scanned.name.clone(),
                    description: scanned.description.clone(),
                    version: scanned.version.clone(),
                    source: SkillSource::Local,
                    source_url: None,
                    checksum: deployed_checksum.clone(),
                    local_path: library_dir.to_string_lossy().to_string(),
                    last_modified_at: Some(now.clone()),
                    created_at: now.clone(),
                    updated_at: now,
                    watcher_modified_at: None,
                    watcher_backup_id: None,
                    watcher_trigger_dep_id: None,
                };
                self.db.insert_skill(&record)?;
                info!(skill = %record.name, "skill imported into library");
                (record, true)
            }
        };

        let status = if deployed_checksum == skill.checksum {
            DeploymentStatus::Synced
        } else {
            DeploymentStatus::Diverged
        };

        let now = now_rfc3339();
        self.db.upsert_deployment(&DeploymentRecord {
            id: Uuid::new_v4().to_string(),
            skill_id: skill.id,
            project_id: project_id.map(ToString::to_string),
            tool: scanned.tool,
            path: scanned.path.clone(),
            checksum: deployed_checksum,
            status,
            last_synced_at: None,
            created_at: now.clone(),
            updated_at: now,
        })?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKILL_MD: &str = "---\nname: frontend-design\ndescription: Design guidance\nversion: 2.1.0\n---\n\n# Frontend design\n";

    #[test]
    fn frontmatter_parses_fields() {
        let fm = parse_frontmatter(SKILL_MD);
        assert_eq!(fm.name.as_deref(), Some("frontend-design"));
        assert_eq!(fm.description.as_deref(), Some("Design guidance"));
        assert_eq!(fm.version.as_deref(), Some("2.1.0"));
    }

    #[test]
    fn frontmatter_absent_yields_defaults() {
        let fm = parse_frontmatter("# Just a doc\n");
        assert!(fm.name.is_none());
    }

    #[test]
    fn frontmatter_unterminated_yields_defaults() {
        let fm = parse_frontmatter("---\nname: x\nno closing fence\n");
        assert!(fm.name.is_none());
    }

    #[test]
    fn scan_finds_skills_under_tool_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let skill_dir = tmp.path().join(".windsurf/skills/frontend-design");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(skill_dir.join("SKILL.md"), SKILL_MD).unwrap();

        let result = scan_project(tmp.path()).unwrap();
        assert_eq!(result.tools, vec![Tool::Windsurf]);
        assert_eq!(result.skills.len(), 1);
        assert_eq!(result.skills[0].name, "frontend-design");
        assert_eq!(result.skills[0].version.as_deref(), Some("2.1.0"));
    }

    #[test]
    fn scan_missing_project_is_path_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = scan_project(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, SyncError::PathUnavailable { .. }));
    }

    #[test]
    fn folder_name_used_when_frontmatter_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let skill_dir = tmp.path().join(".cursor/skills/bare-skill");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(skill_dir.join("SKILL.md"), "# no frontmatter\n").unwrap();

        let result = scan_project(tmp.path()).unwrap();
        assert_eq!(result.skills[0].name, "bare-skill");
    }

    #[test]
    fn import_seeds_library_and_tracks_deployment() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());

        let skill_dir = tmp.path().join("proj/.windsurf/skills/frontend-design");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(skill_dir.join("SKILL.md"), SKILL_MD).unwrap();

        let importer = ScanImporter::new(db.clone(), tmp.path().join("library"));
        let project = importer
            .register_project("proj", &tmp.path().join("proj"))
            .unwrap();
        let scan = scan_project(&tmp.path().join("proj")).unwrap();
        let summary = importer.import(Some(&project.id), &scan.skills).unwrap();

        assert_eq!(summary.skills_created, 1);
        assert_eq!(summary.deployments_tracked, 1);

        let skill = db.get_skill_by_name("frontend-design").unwrap().unwrap();
        assert!(Path::new(&skill.local_path).join("SKILL.md").exists());

        let deps = db.list_deployments_for_skill(&skill.id).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].status, DeploymentStatus::Synced);
        assert_eq!(deps[0].checksum, skill.checksum);
    }

    #[test]
    fn reimport_reuses_existing_skill() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());

        let skill_dir = tmp.path().join("proj/.cursor/skills/demo");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(skill_dir.join("SKILL.md"), "# demo\n").unwrap();

        let importer = ScanImporter::new(db.clone(), tmp.path().join("library"));
        let scan = scan_project(&tmp.path().join("proj")).unwrap();
        importer.import(None, &scan.skills).unwrap();
        let second = importer.import(None, &scan.skills).unwrap();

        assert_eq!(second.skills_created, 0);
        assert_eq!(db.list_skills().unwrap().len(), 1);
        assert_eq!(db.list_deployments().unwrap().len(), 1);
    }

    #[test]
    fn register_project_is_idempotent_by_path() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let importer = ScanImporter::new(db.clone(), tmp.path().join("library"));

        let first = importer.register_project("proj", tmp.path()).unwrap();
        let second = importer.register_project("proj-again", tmp.path()).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(db.list_projects().unwrap().len(), 1);
    }
}
