//! sks reconcile - re-check one deployment.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Deployment id
    pub deployment_id: String,
}

pub fn run(ctx: &AppContext, args: &ReconcileArgs) -> Result<()> {
    let detail = ctx.reconciler().reconcile_one(&args.deployment_id)?;

    if ctx.json {
        return super::print_json(&detail);
    }

    println!(
        "{} {} ({} @ {})",
        detail.status.as_str().bold(),
        detail.skill_name,
        detail.tool,
        detail.deploy_path
    );
    println!(
        "  library:  {}",
        detail.library_checksum.as_deref().unwrap_or("-")
    );
    println!(
        "  deployed: {}",
        detail.deployed_checksum.as_deref().unwrap_or("-")
    );
    Ok(())
}
