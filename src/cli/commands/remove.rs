//! sks remove - delete a deployment.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Deployment id
    pub deployment_id: String,
}

pub fn run(ctx: &AppContext, args: &RemoveArgs) -> Result<()> {
    ctx.executor().delete_deployment(&args.deployment_id)?;

    if ctx.json {
        return super::print_json(&serde_json::json!({ "deleted": args.deployment_id }));
    }
    println!("{} deployment {}", "deleted".green().bold(), args.deployment_id);
    Ok(())
}
