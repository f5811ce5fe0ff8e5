//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::core::models::SkillRecord;
use crate::error::{Result, SyncError};

pub mod backup;
pub mod completions;
pub mod deploy;
pub mod diff;
pub mod events;
pub mod history;
pub mod init;
pub mod merge;
pub mod projects;
pub mod pull;
pub mod reconcile;
pub mod remove;
pub mod skills;
pub mod status;
pub mod sync;
pub mod update;
pub mod watcher;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Init(args) => init::run(ctx, args),
        Commands::Status(args) => status::run(ctx, args),
        Commands::Reconcile(args) => reconcile::run(ctx, args),
        Commands::Diff(args) => diff::run(ctx, args),
        Commands::Merge(args) => merge::run(ctx, args),
        Commands::ApplyMerge(args) => merge::run_apply(ctx, args),
        Commands::Deploy(args) => deploy::run(ctx, args),
        Commands::Sync(args) => sync::run(ctx, args),
        Commands::Pull(args) => pull::run(ctx, args),
        Commands::Remove(args) => remove::run(ctx, args),
        Commands::Backups(args) => backup::run(ctx, args),
        Commands::Watcher(args) => watcher::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
        Commands::Skills(args) => skills::run(ctx, args),
        Commands::Projects(args) => projects::run(ctx, args),
        Commands::Events(args) => events::run(ctx, args),
        Commands::History(args) => history::run(ctx, args),
        Commands::Completions(args) => completions::run(args),
    }
}

/// Resolve a skill reference: exact id first, then unique name.
pub fn resolve_skill(ctx: &AppContext, reference: &str) -> Result<SkillRecord> {
    if let Some(skill) = ctx.db.get_skill(reference)? {
        return Ok(skill);
    }
    ctx.db
        .get_skill_by_name(reference)?
        .ok_or_else(|| SyncError::SkillNotFound(reference.to_string()))
}

/// Print a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
