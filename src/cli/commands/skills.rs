//! sks skills - library skill management.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;
use uuid::Uuid;

use crate::app::AppContext;
use crate::core::checksum::checksum_dir;
use crate::core::models::{SkillRecord, SkillSource};
use crate::error::{Result, SyncError};
use crate::scanner::parse_frontmatter;
use crate::utils::fs::{read_tree, write_tree};
use crate::utils::now_rfc3339;

#[derive(Args, Debug)]
pub struct SkillsArgs {
    #[command(subcommand)]
    pub command: SkillsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SkillsCommand {
    /// List library skills
    List,
    /// Show one skill with its deployments
    Show(SkillShowArgs),
    /// Add a skill to the library from a directory
    Add(SkillAddArgs),
    /// Delete a skill, its deployments, and their files
    Delete(SkillDeleteArgs),
}

#[derive(Args, Debug)]
pub struct SkillShowArgs {
    /// Skill id or name
    pub skill: String,
}

#[derive(Args, Debug)]
pub struct SkillAddArgs {
    /// Directory holding the skill (must contain SKILL.md)
    pub path: PathBuf,
    /// Override the skill name (default: frontmatter, then folder name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct SkillDeleteArgs {
    /// Skill id or name
    pub skill: String,
}

pub fn run(ctx: &AppContext, args: &SkillsArgs) -> Result<()> {
    match &args.command {
        SkillsCommand::List => run_list(ctx),
        SkillsCommand::Show(show) => run_show(ctx, show),
        SkillsCommand::Add(add) => run_add(ctx, add),
        SkillsCommand::Delete(delete) => run_delete(ctx, delete),
    }
}

fn run_list(ctx: &AppContext) -> Result<()> {
    let skills = ctx.db.list_skills()?;

    if ctx.json {
        return super::print_json(&skills);
    }

    for skill in &skills {
        let pending = if skill.watcher_pending() {
            " [watcher pending]".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{:<24} {:<10} {}{}",
            skill.name,
            skill.version.as_deref().unwrap_or("-"),
            skill.source.as_str(),
            pending
        );
    }
    Ok(())
}

fn run_show(ctx: &AppContext, args: &SkillShowArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    let deployments = ctx.db.list_deployments_for_skill(&skill.id)?;

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "skill": skill,
            "deployments": deployments,
        }));
    }

    println!("{} ({})", skill.name.bold(), skill.id);
    if let Some(description) = &skill.description {
        println!("  {description}");
    }
    println!("  version:  {}", skill.version.as_deref().unwrap_or("-"));
    println!("  source:   {}", skill.source.as_str());
    println!("  library:  {}", skill.local_path);
    println!("  checksum: {}", skill.checksum.as_deref().unwrap_or("-"));
    if skill.watcher_pending() {
        println!(
            "  {} absorbed change pending (trigger {}, backup {})",
            "watcher:".yellow().bold(),
            skill.watcher_trigger_dep_id.as_deref().unwrap_or("-"),
            skill.watcher_backup_id.as_deref().unwrap_or("none")
        );
    }

    println!("  deployments:");
    for dep in &deployments {
        println!(
            "    {}  {:<10} {:<12} {}",
            dep.id,
            dep.status.as_str(),
            dep.tool,
            dep.path
        );
    }
    Ok(())
}

fn run_add(ctx: &AppContext, args: &SkillAddArgs) -> Result<()> {
    if !args.path.join("SKILL.md").exists() {
        return Err(SyncError::Validation(format!(
            "{} has no SKILL.md",
            args.path.display()
        )));
    }

    let frontmatter = std::fs::read_to_string(args.path.join("SKILL.md"))
        .map(|content| parse_frontmatter(&content))
        .unwrap_or_default();
    let folder_name = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = args
        .name
        .clone()
        .or(frontmatter.name)
        .unwrap_or(folder_name);

    if ctx.db.get_skill_by_name(&name)?.is_some() {
        return Err(SyncError::Validation(format!(
            "skill {name} already exists in the library"
        )));
    }

    let library_dir = ctx.library_root().join(&name);
    let tree = read_tree(&args.path)?;
    let outcome = write_tree(&library_dir, &tree)?;
    if let Some(first) = outcome.failures.first() {
        return Err(SyncError::Validation(format!(
            "library copy failed at {}: {}",
            first.path, first.error
        )));
    }

    let now = now_rfc3339();
    let record = SkillRecord {
        id: Uuid::new_v4().to_string(),
        name: name.clone(),
        description: frontmatter.description,
        version: frontmatter.version,
        source: SkillSource::Local,
        source_url: None,
        checksum: checksum_dir(&library_dir)?.map(crate::core::Checksum::into_string),
        local_path: library_dir.to_string_lossy().to_string(),
        last_modified_at: Some(now.clone()),
        created_at: now.clone(),
        updated_at: now,
        watcher_modified_at: None,
        watcher_backup_id: None,
        watcher_trigger_dep_id: None,
    };
    ctx.db.insert_skill(&record)?;

    if ctx.json {
        return super::print_json(&record);
    }
    println!("{} {} ({})", "added".green().bold(), record.name, record.id);
    Ok(())
}

fn run_delete(ctx: &AppContext, args: &SkillDeleteArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    let executor = ctx.executor();

    // Deployments go first: files and records together, so a filesystem
    // failure never leaves a ghost record behind.
    let mut deployments_deleted = 0usize;
    for dep in ctx.db.list_deployments_for_skill(&skill.id)? {
        executor.delete_deployment(&dep.id)?;
        deployments_deleted += 1;
    }

    crate::utils::fs::remove_tree(std::path::Path::new(&skill.local_path))?;
    ctx.db.delete_skill(&skill.id)?;

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "deleted": skill.id,
            "deployments_deleted": deployments_deleted,
        }));
    }
    println!(
        "{} {} and {} deployments",
        "deleted".green().bold(),
        skill.name,
        deployments_deleted
    );
    Ok(())
}
