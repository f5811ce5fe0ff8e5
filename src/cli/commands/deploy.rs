//! sks deploy - place a skill at a tool target.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;
use crate::sync::ConflictStatus;
use crate::tools::Tool;

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Skill id or name
    pub skill: String,
    /// Target tool
    #[arg(long, value_parser = Tool::from_id)]
    pub tool: Tool,
    /// Project id for a project-scoped deployment (omit for global)
    #[arg(long)]
    pub project: Option<String>,
    /// Overwrite divergent content at the target
    #[arg(long)]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: &DeployArgs) -> Result<()> {
    let skill = super::resolve_skill(ctx, &args.skill)?;
    let outcome = ctx.executor().deploy_to_target(
        &skill.id,
        args.tool,
        args.project.as_deref(),
        args.force,
    )?;

    if ctx.json {
        return super::print_json(&outcome);
    }

    match &outcome.conflict {
        Some(conflict) if conflict.status == ConflictStatus::ExistsDifferent => {
            println!(
                "{} target already has different content: {}",
                "refused:".red().bold(),
                outcome.deploy_path
            );
            println!("  existing: {}", conflict.existing_checksum.as_deref().unwrap_or("-"));
            println!("  library:  {}", conflict.library_checksum.as_deref().unwrap_or("-"));
            println!("  pass --force to overwrite");
        }
        Some(_) => {
            println!(
                "{} already in place at {}",
                "unchanged:".green(),
                outcome.deploy_path
            );
        }
        None => {
            println!(
                "{} {} files to {}",
                "deployed".green().bold(),
                outcome.files_copied,
                outcome.deploy_path
            );
        }
    }
    Ok(())
}
