//! sks projects - project registry and scanning.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::error::{Result, SyncError};
use crate::scanner::scan_project;

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// Register a project root
    Add(ProjectAddArgs),
    /// List registered projects
    List,
    /// Scan a project for skill folders, optionally importing them
    Scan(ProjectScanArgs),
}

#[derive(Args, Debug)]
pub struct ProjectAddArgs {
    /// Project root directory
    pub path: PathBuf,
    /// Display name (default: directory name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProjectScanArgs {
    /// Project root directory
    pub path: PathBuf,
    /// Import discovered skills into the library and track deployments
    #[arg(long)]
    pub import: bool,
}

pub fn run(ctx: &AppContext, args: &ProjectsArgs) -> Result<()> {
    match &args.command {
        ProjectsCommand::Add(add) => run_add(ctx, add),
        ProjectsCommand::List => run_list(ctx),
        ProjectsCommand::Scan(scan) => run_scan(ctx, scan),
    }
}

fn run_add(ctx: &AppContext, args: &ProjectAddArgs) -> Result<()> {
    if !args.path.exists() {
        return Err(SyncError::PathUnavailable {
            path: args.path.clone(),
        });
    }
    let name = args.name.clone().unwrap_or_else(|| {
        args.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    });
    let record = ctx.importer().register_project(&name, &args.path)?;

    if ctx.json {
        return super::print_json(&record);
    }
    println!("{} {} ({})", "registered".green().bold(), record.name, record.id);
    Ok(())
}

fn run_list(ctx: &AppContext) -> Result<()> {
    let projects = ctx.db.list_projects()?;

    if ctx.json {
        return super::print_json(&projects);
    }
    for project in &projects {
        println!("{:<24} {}  {}", project.name, project.id, project.path);
    }
    Ok(())
}

fn run_scan(ctx: &AppContext, args: &ProjectScanArgs) -> Result<()> {
    let scan = scan_project(&args.path)?;

    if !args.import {
        if ctx.json {
            return super::print_json(&scan);
        }
        println!(
            "found {} skills under {} tool directories",
            scan.skills.len(),
            scan.tools.len()
        );
        for skill in &scan.skills {
            println!("  {:<24} {:<12} {}", skill.name, skill.tool, skill.path);
        }
        return Ok(());
    }

    let importer = ctx.importer();
    let name = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let project = importer.register_project(&name, &args.path)?;
    let summary = importer.import(Some(&project.id), &scan.skills)?;

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "project": project,
            "summary": summary,
        }));
    }
    println!(
        "{} {} skills created, {} deployments tracked, {} skipped",
        "imported".green().bold(),
        summary.skills_created,
        summary.deployments_tracked,
        summary.skipped
    );
    Ok(())
}
