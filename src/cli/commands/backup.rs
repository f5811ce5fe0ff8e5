//! sks backups - list and restore library snapshots.

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::core::models::BackupReason;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// List backups for a skill
    List(BackupListArgs),
    /// Snapshot a skill's current library content
    Create(BackupCreateArgs),
    /// Restore the library from a backup
    Restore(BackupRestoreArgs),
}

#[derive(Args, Debug)]
pub struct BackupListArgs {
    /// Skill id or name
    pub skill: String,
}

#[derive(Args, Debug)]
pub struct BackupCreateArgs {
    /// Skill id or name
    pub skill: String,
}

#[derive(Args, Debug)]
pub struct BackupRestoreArgs {
    /// Backup id
    pub backup_id: String,
    /// Also push the restored library to all deployments
    #[arg(long)]
    pub sync: bool,
}

pub fn run(ctx: &AppContext, args: &BackupArgs) -> Result<()> {
    match &args.command {
        BackupCommand::List(list) => run_list(ctx, list),
        BackupCommand::Create(create) => run_create(ctx, create),
        BackupCommand::Restore(restore) => run_restore(ctx, restore),
    }
}

fn run_list(ctx: &AppContext, args: &BackupListArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    let backups = ctx.db.list_backups_for_skill(&skill.id)?;

    if ctx.json {
        return super::print_json(&backups);
    }

    if backups.is_empty() {
        println!("no backups for {}", skill.name);
        return Ok(());
    }
    for backup in &backups {
        println!(
            "{}  {:<12} {}  {}",
            backup.id,
            backup.reason.as_str(),
            backup.created_at,
            backup.version_label.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn run_create(ctx: &AppContext, args: &BackupCreateArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    let backup = ctx.backups().create(&skill, BackupReason::Manual)?;

    if ctx.json {
        return super::print_json(&backup);
    }

    match backup {
        Some(record) => println!("{} backup {}", "created".green().bold(), record.id),
        None => println!("nothing to back up: library directory is missing"),
    }
    Ok(())
}

fn run_restore(ctx: &AppContext, args: &BackupRestoreArgs) -> Result<()> {
    let outcome = ctx.executor().restore_from_backup(&args.backup_id, args.sync)?;

    if ctx.json {
        return super::print_json(&outcome);
    }

    println!(
        "{} library from backup {} (version {})",
        "restored".green().bold(),
        args.backup_id,
        outcome.restored_version.as_deref().unwrap_or("-")
    );
    if args.sync {
        println!("  {} deployments synced", outcome.deployments_synced);
    }
    Ok(())
}
