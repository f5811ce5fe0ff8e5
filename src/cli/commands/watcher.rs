//! sks watcher - absorption protocol and its resolution actions.

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;
use crate::sync::AbsorbOutcome;

#[derive(Args, Debug)]
pub struct WatcherArgs {
    #[command(subcommand)]
    pub command: WatcherCommand,
}

#[derive(Subcommand, Debug)]
pub enum WatcherCommand {
    /// Absorb an external change detected on a deployment
    Absorb(AbsorbArgs),
    /// Push the absorbed change to every other deployment
    FullSync(SkillRefArgs),
    /// Accept the absorbed change without propagating
    DbOnly(SkillRefArgs),
    /// Restore the pre-change library and push it back to the trigger
    Discard(SkillRefArgs),
}

#[derive(Args, Debug)]
pub struct AbsorbArgs {
    /// Deployment id the change was detected on
    pub deployment_id: String,
}

#[derive(Args, Debug)]
pub struct SkillRefArgs {
    /// Skill id or name
    pub skill: String,
}

pub fn run(ctx: &AppContext, args: &WatcherArgs) -> Result<()> {
    match &args.command {
        WatcherCommand::Absorb(absorb) => run_absorb(ctx, absorb),
        WatcherCommand::FullSync(skill) => run_full_sync(ctx, skill),
        WatcherCommand::DbOnly(skill) => run_db_only(ctx, skill),
        WatcherCommand::Discard(skill) => run_discard(ctx, skill),
    }
}

fn run_absorb(ctx: &AppContext, args: &AbsorbArgs) -> Result<()> {
    let outcome = ctx.watcher().absorb_change(&args.deployment_id)?;

    if ctx.json {
        return super::print_json(&outcome);
    }

    match outcome {
        AbsorbOutcome::Unchanged => println!("no content change; nothing absorbed"),
        AbsorbOutcome::Absorbed {
            backup_id,
            coalesced,
        } => {
            println!(
                "{} change into library (backup {}{})",
                "absorbed".yellow().bold(),
                backup_id.as_deref().unwrap_or("none"),
                if coalesced { ", coalesced" } else { "" }
            );
            println!("resolve with: sks watcher full-sync | db-only | discard <skill>");
        }
    }
    Ok(())
}

fn run_full_sync(ctx: &AppContext, args: &SkillRefArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    let synced = ctx.watcher().full_sync(&skill.id, &ctx.executor())?;

    if ctx.json {
        return super::print_json(&serde_json::json!({ "synced": synced }));
    }
    println!(
        "{} {} other deployments",
        "synced".green().bold(),
        synced
    );
    Ok(())
}

fn run_db_only(ctx: &AppContext, args: &SkillRefArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    ctx.watcher().db_only(&skill.id)?;

    if ctx.json {
        return super::print_json(&serde_json::json!({ "resolved": skill.id }));
    }
    println!(
        "{} change accepted; other deployments stay diverged",
        "resolved".green().bold()
    );
    Ok(())
}

fn run_discard(ctx: &AppContext, args: &SkillRefArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    ctx.watcher().discard(&skill.id, &ctx.executor())?;

    if ctx.json {
        return super::print_json(&serde_json::json!({ "discarded": skill.id }));
    }
    println!(
        "{} change discarded; library and trigger restored",
        "restored".green().bold()
    );
    Ok(())
}
