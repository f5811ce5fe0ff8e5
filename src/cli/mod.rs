//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

/// Keep AI coding-tool Skills consistent across library, deployments, and
/// remote catalogs.
#[derive(Parser, Debug)]
#[command(name = "sks")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/skillsync/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Application root (default: ~/.skillsync)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the application root and database
    Init(commands::init::InitArgs),
    /// Reconcile all deployments and show the consistency report
    Status(commands::status::StatusArgs),
    /// Re-check a single deployment
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Diff two skill directories
    Diff(commands::diff::DiffArgs),
    /// Merge two skill directories, optionally against a base snapshot
    Merge(commands::merge::MergeArgs),
    /// Apply a merge with conflict resolutions
    ApplyMerge(commands::merge::ApplyMergeArgs),
    /// Deploy a skill to a tool target
    Deploy(commands::deploy::DeployArgs),
    /// Push library content to a deployment
    Sync(commands::sync::SyncArgs),
    /// Pull deployment content back into the library
    Pull(commands::pull::PullArgs),
    /// Delete a deployment (files and record)
    Remove(commands::remove::RemoveArgs),
    /// List or restore library backups
    Backups(commands::backup::BackupArgs),
    /// Watcher absorption and resolution actions
    Watcher(commands::watcher::WatcherArgs),
    /// Check remote catalogs for skill updates
    Update(commands::update::UpdateArgs),
    /// Manage library skills
    Skills(commands::skills::SkillsArgs),
    /// Manage registered projects
    Projects(commands::projects::ProjectsArgs),
    /// List or resolve change events
    Events(commands::events::EventsArgs),
    /// Show the sync action audit log
    History(commands::history::HistoryArgs),
    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}
