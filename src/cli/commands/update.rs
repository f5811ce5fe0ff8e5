//! sks update - remote catalog update check.

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(subcommand)]
    pub command: UpdateCommand,
}

#[derive(Subcommand, Debug)]
pub enum UpdateCommand {
    /// Compare installed skills against their remote catalogs
    Check,
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    match args.command {
        UpdateCommand::Check => run_check(ctx),
    }
}

fn run_check(ctx: &AppContext) -> Result<()> {
    let results = ctx.update_checker()?.run()?;

    if ctx.json {
        return super::print_json(&results);
    }

    if results.is_empty() {
        println!("no remotely-sourced skills to check");
        return Ok(());
    }

    for info in &results {
        let marker = if info.has_update {
            "update".yellow().bold()
        } else {
            "current".green()
        };
        let modified = if info.locally_modified {
            " (locally modified — update requires --force)"
        } else {
            ""
        };
        println!(
            "{:<8} {:<24} {}/{}{}",
            marker, info.skill_name, info.owner_repo, info.remote_path, modified
        );
    }
    Ok(())
}
