//! sks pull - update the library from a deployment.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Deployment id to pull from
    pub deployment_id: String,
    /// Also push the updated library to every other deployment
    #[arg(long)]
    pub propagate: bool,
}

pub fn run(ctx: &AppContext, args: &PullArgs) -> Result<()> {
    let outcome = ctx
        .executor()
        .update_library_from_deployment(&args.deployment_id, args.propagate)?;

    if ctx.json {
        return super::print_json(&outcome);
    }

    println!(
        "{} library for {} (backup {})",
        "updated".green().bold(),
        outcome.skill_name,
        outcome.backup_id.as_deref().unwrap_or("none")
    );
    if args.propagate {
        println!("  {} other deployments synced", outcome.other_deployments_synced);
    }
    Ok(())
}
