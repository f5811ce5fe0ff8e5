//! sks sync - push library content to a deployment.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Deployment id
    pub deployment_id: String,
}

pub fn run(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    let outcome = ctx.executor().sync_deployment(&args.deployment_id)?;

    if ctx.json {
        return super::print_json(&outcome);
    }

    println!(
        "{} {} files ({} -> {})",
        "synced".green().bold(),
        outcome.files_copied,
        outcome.old_checksum.as_deref().unwrap_or("-"),
        outcome.new_checksum.as_deref().unwrap_or("-")
    );
    Ok(())
}
