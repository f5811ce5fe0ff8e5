//! SQLite database layer

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::core::models::{
    BackupReason, BackupRecord, ChangeEventRecord, ChangeEventType, DeploymentRecord,
    DeploymentStatus, EventResolution, ProjectRecord, SkillRecord, SkillSource,
    SkillSourceRecord, SyncAction, SyncHistoryRecord,
};
use crate::error::{Result, SyncError};
use crate::storage::migrations;
use crate::tools::Tool;
use crate::utils::now_rfc3339;

/// SQLite database wrapper for the skill registry.
pub struct Database {
    conn: Connection,
    schema_version: u32,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open the database at the given path, running migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;
        Ok(Self {
            conn,
            schema_version,
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Current schema version after migrations.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Borrow the underlying connection.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Projects ──

    pub fn insert_project(&self, project: &ProjectRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO projects (id, name, path, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id,
                project.name,
                project.path,
                project.created_at,
                project.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> Result<Option<ProjectRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, path, created_at, updated_at FROM projects WHERE id = ?1",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(project_from_row(row)?));
        }
        Ok(None)
    }

    pub fn get_project_by_path(&self, path: &str) -> Result<Option<ProjectRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, path, created_at, updated_at FROM projects WHERE path = ?1",
        )?;
        let mut rows = stmt.query([path])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(project_from_row(row)?));
        }
        Ok(None)
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, path, created_at, updated_at FROM projects ORDER BY name",
        )?;
        let rows = stmt.query_map([], project_from_row)?;
        collect(rows)
    }

    // ── Skills ──

    pub fn insert_skill(&self, skill: &SkillRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO skills (
                id, name, description, version, source, source_url, checksum,
                local_path, last_modified_at, created_at, updated_at,
                watcher_modified_at, watcher_backup_id, watcher_trigger_dep_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                skill.id,
                skill.name,
                skill.description,
                skill.version,
                skill.source.as_str(),
                skill.source_url,
                skill.checksum,
                skill.local_path,
                skill.last_modified_at,
                skill.created_at,
                skill.updated_at,
                skill.watcher_modified_at,
                skill.watcher_backup_id,
                skill.watcher_trigger_dep_id,
            ],
        )?;
        Ok(())
    }

    pub fn get_skill(&self, id: &str) -> Result<Option<SkillRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills WHERE id = ?1"
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(skill_from_row(row)?));
        }
        Ok(None)
    }

    /// Get a skill or fail with `SkillNotFound`.
    pub fn require_skill(&self, id: &str) -> Result<SkillRecord> {
        self.get_skill(id)?
            .ok_or_else(|| SyncError::SkillNotFound(id.to_string()))
    }

    pub fn get_skill_by_name(&self, name: &str) -> Result<Option<SkillRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills WHERE name = ?1"
        ))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(skill_from_row(row)?));
        }
        Ok(None)
    }

    pub fn list_skills(&self) -> Result<Vec<SkillRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills ORDER BY name"
        ))?;
        let rows = stmt.query_map([], skill_from_row)?;
        collect(rows)
    }

    /// Update checksum and modification stamp after a library write.
    pub fn update_skill_checksum(&self, id: &str, checksum: Option<&str>) -> Result<()> {
        let now = now_rfc3339();
        self.conn.execute(
            "UPDATE skills SET checksum = ?1, last_modified_at = ?2, updated_at = ?2
             WHERE id = ?3",
            params![checksum, now, id],
        )?;
        Ok(())
    }

    /// Record a pending watcher absorption.
    pub fn set_watcher_pending(
        &self,
        skill_id: &str,
        backup_id: Option<&str>,
        trigger_dep_id: &str,
    ) -> Result<()> {
        let now = now_rfc3339();
        self.conn.execute(
            "UPDATE skills SET watcher_modified_at = ?1, watcher_backup_id = ?2,
                    watcher_trigger_dep_id = ?3, updated_at = ?1
             WHERE id = ?4",
            params![now, backup_id, trigger_dep_id, skill_id],
        )?;
        Ok(())
    }

    /// Clear the watcher-pending fields after a resolution action.
    pub fn clear_watcher_pending(&self, skill_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE skills SET watcher_modified_at = NULL, watcher_backup_id = NULL,
                    watcher_trigger_dep_id = NULL, updated_at = ?1
             WHERE id = ?2",
            params![now_rfc3339(), skill_id],
        )?;
        Ok(())
    }

    pub fn delete_skill(&self, id: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM skills WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(SyncError::SkillNotFound(id.to_string()));
        }
        Ok(())
    }

    // ── Skill sources ──

    pub fn upsert_skill_source(&self, source: &SkillSourceRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO skill_sources (
                skill_id, installed_version, original_checksum, remote_sha,
                owner_repo, remote_path, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(skill_id) DO UPDATE SET
                installed_version = excluded.installed_version,
                original_checksum = excluded.original_checksum,
                remote_sha = excluded.remote_sha,
                owner_repo = excluded.owner_repo,
                remote_path = excluded.remote_path,
                updated_at = excluded.updated_at",
            params![
                source.skill_id,
                source.installed_version,
                source.original_checksum,
                source.remote_sha,
                source.owner_repo,
                source.remote_path,
                source.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_skill_source(&self, skill_id: &str) -> Result<Option<SkillSourceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT skill_id, installed_version, original_checksum, remote_sha,
                    owner_repo, remote_path, updated_at
             FROM skill_sources WHERE skill_id = ?1",
        )?;
        let mut rows = stmt.query([skill_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(source_from_row(row)?));
        }
        Ok(None)
    }

    /// Refresh the install-time checksum after a deliberate library update.
    pub fn set_source_original_checksum(
        &self,
        skill_id: &str,
        checksum: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE skill_sources SET original_checksum = ?1, updated_at = ?2
             WHERE skill_id = ?3",
            params![checksum, now_rfc3339(), skill_id],
        )?;
        Ok(())
    }

    // ── Deployments ──

    /// Insert or update the deployment for a (skill, project, tool) target.
    pub fn upsert_deployment(&self, dep: &DeploymentRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO deployments (
                id, skill_id, project_id, tool, path, checksum, status,
                last_synced_at, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(skill_id, COALESCE(project_id, ''), tool) DO UPDATE SET
                path = excluded.path,
                checksum = excluded.checksum,
                status = excluded.status,
                last_synced_at = excluded.last_synced_at,
                updated_at = excluded.updated_at",
            params![
                dep.id,
                dep.skill_id,
                dep.project_id,
                dep.tool.id(),
                dep.path,
                dep.checksum,
                dep.status.as_str(),
                dep.last_synced_at,
                dep.created_at,
                dep.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_deployment(&self, id: &str) -> Result<Option<DeploymentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE id = ?1"
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(deployment_from_row(row)?));
        }
        Ok(None)
    }

    /// Get a deployment or fail with `DeploymentNotFound`.
    pub fn require_deployment(&self, id: &str) -> Result<DeploymentRecord> {
        self.get_deployment(id)?
            .ok_or_else(|| SyncError::DeploymentNotFound(id.to_string()))
    }

    pub fn list_deployments(&self) -> Result<Vec<DeploymentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments ORDER BY tool, path"
        ))?;
        let rows = stmt.query_map([], deployment_from_row)?;
        collect(rows)
    }

    pub fn list_deployments_for_skill(&self, skill_id: &str) -> Result<Vec<DeploymentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE skill_id = ?1 ORDER BY tool, path"
        ))?;
        let rows = stmt.query_map([skill_id], deployment_from_row)?;
        collect(rows)
    }

    pub fn find_deployment_by_path(&self, path: &str) -> Result<Option<DeploymentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE path = ?1"
        ))?;
        let mut rows = stmt.query([path])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(deployment_from_row(row)?));
        }
        Ok(None)
    }

    /// Atomic status update for one deployment.
    pub fn set_deployment_status(&self, id: &str, status: DeploymentStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE deployments SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Record a successful sync: new checksum, synced status, timestamps.
    pub fn mark_deployment_synced(&self, id: &str, checksum: Option<&str>) -> Result<()> {
        let now = now_rfc3339();
        self.conn.execute(
            "UPDATE deployments SET checksum = ?1, status = 'synced',
                    last_synced_at = ?2, updated_at = ?2
             WHERE id = ?3",
            params![checksum, now, id],
        )?;
        Ok(())
    }

    pub fn delete_deployment(&self, id: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM deployments WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(SyncError::DeploymentNotFound(id.to_string()));
        }
        Ok(())
    }

    // ── Change events ──

    pub fn insert_change_event(&self, event: &ChangeEventRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO change_events (
                id, deployment_id, event_type, old_checksum, new_checksum,
                resolution, resolved_at, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.id,
                event.deployment_id,
                event.event_type.as_str(),
                event.old_checksum,
                event.new_checksum,
                event.resolution.as_str(),
                event.resolved_at,
                event.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_change_events(
        &self,
        resolution: Option<EventResolution>,
    ) -> Result<Vec<ChangeEventRecord>> {
        let rows = match resolution {
            Some(res) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, deployment_id, event_type, old_checksum, new_checksum,
                            resolution, resolved_at, created_at
                     FROM change_events WHERE resolution = ?1 ORDER BY created_at DESC",
                )?;
                let rows = stmt.query_map([res.as_str()], event_from_row)?;
                collect(rows)?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, deployment_id, event_type, old_checksum, new_checksum,
                            resolution, resolved_at, created_at
                     FROM change_events ORDER BY created_at DESC",
                )?;
                let rows = stmt.query_map([], event_from_row)?;
                collect(rows)?
            }
        };
        Ok(rows)
    }

    pub fn resolve_change_event(&self, id: &str, resolution: EventResolution) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE change_events SET resolution = ?1, resolved_at = ?2 WHERE id = ?3",
            params![resolution.as_str(), now_rfc3339(), id],
        )?;
        if affected == 0 {
            return Err(SyncError::Validation(format!("change event not found: {id}")));
        }
        Ok(())
    }

    pub fn count_pending_events(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM change_events WHERE resolution = 'pending'",
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    // ── Sync history ──

    pub fn insert_history(&self, entry: &SyncHistoryRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sync_history (
                id, skill_id, deployment_id, action, from_checksum, to_checksum,
                status, error_message, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id,
                entry.skill_id,
                entry.deployment_id,
                entry.action.as_str(),
                entry.from_checksum,
                entry.to_checksum,
                entry.status,
                entry.error_message,
                entry.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_history(&self, limit: usize) -> Result<Vec<SyncHistoryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, skill_id, deployment_id, action, from_checksum, to_checksum,
                    status, error_message, created_at
             FROM sync_history ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], history_from_row)?;
        collect(rows)
    }

    // ── Backups ──

    pub fn insert_backup(&self, backup: &BackupRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO backups (
                id, skill_id, version_label, backup_path, checksum, reason, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                backup.id,
                backup.skill_id,
                backup.version_label,
                backup.backup_path,
                backup.checksum,
                backup.reason.as_str(),
                backup.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_backup(&self, id: &str) -> Result<Option<BackupRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, skill_id, version_label, backup_path, checksum, reason, created_at
             FROM backups WHERE id = ?1",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(backup_from_row(row)?));
        }
        Ok(None)
    }

    /// Get a backup or fail with `BackupNotFound`.
    pub fn require_backup(&self, id: &str) -> Result<BackupRecord> {
        self.get_backup(id)?
            .ok_or_else(|| SyncError::BackupNotFound(id.to_string()))
    }

    pub fn list_backups_for_skill(&self, skill_id: &str) -> Result<Vec<BackupRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, skill_id, version_label, backup_path, checksum, reason, created_at
             FROM backups WHERE skill_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([skill_id], backup_from_row)?;
        collect(rows)
    }

    // ── Stats ──

    /// Counts for the status dashboard.
    pub fn dashboard_counts(&self) -> Result<(u64, u64, u64, u64)> {
        let skills: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM skills", [], |row| row.get(0))?;
        let deployments: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM deployments", [], |row| row.get(0))?;
        let diverged: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM deployments WHERE status = 'diverged'",
            [],
            |row| row.get(0),
        )?;
        let pending = self.count_pending_events()?;
        Ok((
            skills.max(0) as u64,
            deployments.max(0) as u64,
            diverged.max(0) as u64,
            pending,
        ))
    }
}

const SKILL_COLUMNS: &str = "id, name, description, version, source, source_url, checksum, \
     local_path, last_modified_at, created_at, updated_at, \
     watcher_modified_at, watcher_backup_id, watcher_trigger_dep_id";

const DEPLOYMENT_COLUMNS: &str = "id, skill_id, project_id, tool, path, checksum, status, \
     last_synced_at, created_at, updated_at";

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn conversion_error(idx: usize, err: SyncError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn skill_from_row(row: &Row<'_>) -> rusqlite::Result<SkillRecord> {
    let source: String = row.get(4)?;
    Ok(SkillRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        version: row.get(3)?,
        source: SkillSource::parse(&source).map_err(|e| conversion_error(4, e))?,
        source_url: row.get(5)?,
        checksum: row.get(6)?,
        local_path: row.get(7)?,
        last_modified_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        watcher_modified_at: row.get(11)?,
        watcher_backup_id: row.get(12)?,
        watcher_trigger_dep_id: row.get(13)?,
    })
}

fn deployment_from_row(row: &Row<'_>) -> rusqlite::Result<DeploymentRecord> {
    let tool: String = row.get(3)?;
    let status: String = row.get(6)?;
    Ok(DeploymentRecord {
        id: row.get(0)?,
        skill_id: row.get(1)?,
        project_id: row.get(2)?,
        tool: Tool::from_id(&tool).map_err(|e| conversion_error(3, e))?,
        path: row.get(4)?,
        checksum: row.get(5)?,
        status: DeploymentStatus::parse(&status).map_err(|e| conversion_error(6, e))?,
        last_synced_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<SkillSourceRecord> {
    Ok(SkillSourceRecord {
        skill_id: row.get(0)?,
        installed_version: row.get(1)?,
        original_checksum: row.get(2)?,
        remote_sha: row.get(3)?,
        owner_repo: row.get(4)?,
        remote_path: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<ChangeEventRecord> {
    let event_type: String = row.get(2)?;
    let resolution: String = row.get(5)?;
    Ok(ChangeEventRecord {
        id: row.get(0)?,
        deployment_id: row.get(1)?,
        event_type: ChangeEventType::parse(&event_type).map_err(|e| conversion_error(2, e))?,
        old_checksum: row.get(3)?,
        new_checksum: row.get(4)?,
        resolution: EventResolution::parse(&resolution).map_err(|e| conversion_error(5, e))?,
        resolved_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<SyncHistoryRecord> {
    let action: String = row.get(3)?;
    Ok(SyncHistoryRecord {
        id: row.get(0)?,
        skill_id: row.get(1)?,
        deployment_id: row.get(2)?,
        action: SyncAction::parse(&action).map_err(|e| conversion_error(3, e))?,
        from_checksum: row.get(4)?,
        to_checksum: row.get(5)?,
        status: row.get(6)?,
        error_message: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn backup_from_row(row: &Row<'_>) -> rusqlite::Result<BackupRecord> {
    let reason: String = row.get(5)?;
    Ok(BackupRecord {
        id: row.get(0)?,
        skill_id: row.get(1)?,
        version_label: row.get(2)?,
        backup_path: row.get(3)?,
        checksum: row.get(4)?,
        reason: BackupReason::parse(&reason).map_err(|e| conversion_error(5, e))?,
        created_at: row.get(6)?,
    })
}
