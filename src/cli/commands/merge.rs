//! sks merge / apply-merge - reconcile two skill copies.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::{Result, SyncError};
use crate::merge::{
    apply_merge, merge_paths, MergeFileStatus, MergeResolution, ResolutionChoice,
};

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Left side (typically the library copy)
    pub left: PathBuf,
    /// Right side (typically the deployed copy)
    pub right: PathBuf,
    /// Base snapshot (e.g. a backup of the last-synced state)
    #[arg(long)]
    pub base: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ApplyMergeArgs {
    /// Left side (typically the library copy)
    pub left: PathBuf,
    /// Right side (typically the deployed copy)
    pub right: PathBuf,
    /// Directory the merged result is written to
    pub target: PathBuf,
    /// Base snapshot used when the merge was computed
    #[arg(long)]
    pub base: Option<PathBuf>,
    /// Inline resolution, `path=left|right|delete` (repeatable)
    #[arg(long = "keep", value_name = "PATH=CHOICE")]
    pub keep: Vec<String>,
    /// JSON file with resolutions, e.g. `[{"path":"SKILL.md","choice":"manual","content":"..."}]`
    #[arg(long)]
    pub resolutions: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &MergeArgs) -> Result<()> {
    let result = merge_paths(args.base.as_deref(), &args.left, &args.right)?;

    if ctx.json {
        return super::print_json(&result);
    }

    println!(
        "{} files: {} auto-merged, {} conflicts",
        result.total_files,
        result.auto_merged_count.to_string().green(),
        result.conflict_count.to_string().red()
    );
    for file in &result.files {
        let label = match file.status {
            MergeFileStatus::Unchanged => continue,
            MergeFileStatus::AddedLeft => "added (library)".green(),
            MergeFileStatus::AddedRight => "added (deployment)".green(),
            MergeFileStatus::AutoMerged => "auto-merged".green(),
            MergeFileStatus::DeletedLeft => "deleted in library".red(),
            MergeFileStatus::DeletedRight => "deleted in deployment".red(),
            MergeFileStatus::Conflict => "conflict".red().bold(),
        };
        println!("  {:<24} {}", label, file.path);
    }
    if result.conflict_count > 0 {
        println!(
            "\nresolve with: sks apply-merge <left> <right> <target> --keep <path>=left|right"
        );
    }
    Ok(())
}

pub fn run_apply(ctx: &AppContext, args: &ApplyMergeArgs) -> Result<()> {
    let result = merge_paths(args.base.as_deref(), &args.left, &args.right)?;
    let resolutions = gather_resolutions(args)?;

    let report = apply_merge(&args.target, &result, &resolutions)?;

    if ctx.json {
        return super::print_json(&report);
    }

    println!(
        "{} files written to {}",
        report.files_written.to_string().green(),
        args.target.display()
    );
    for failure in &report.failures {
        println!("  {} {}: {}", "failed".red().bold(), failure.path, failure.error);
    }
    Ok(())
}

fn gather_resolutions(args: &ApplyMergeArgs) -> Result<Vec<MergeResolution>> {
    let mut resolutions = Vec::new();

    if let Some(file) = &args.resolutions {
        let raw = std::fs::read_to_string(file)?;
        let mut from_file: Vec<MergeResolution> = serde_json::from_str(&raw)?;
        resolutions.append(&mut from_file);
    }

    for entry in &args.keep {
        let (path, choice) = entry.split_once('=').ok_or_else(|| {
            SyncError::Validation(format!("expected PATH=CHOICE, got: {entry}"))
        })?;
        let choice = match choice {
            "left" => ResolutionChoice::UseLeft,
            "right" => ResolutionChoice::UseRight,
            "delete" => ResolutionChoice::Delete,
            other => {
                return Err(SyncError::Validation(format!(
                    "unknown choice {other}; use left, right, or delete"
                )))
            }
        };
        resolutions.push(MergeResolution {
            path: path.to_string(),
            choice,
        });
    }

    Ok(resolutions)
}
