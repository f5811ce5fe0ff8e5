//! sks status - full reconciliation report.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::core::models::DeploymentStatus;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show deployments that are not synced
    #[arg(long)]
    pub problems: bool,
}

pub fn run(ctx: &AppContext, args: &StatusArgs) -> Result<()> {
    let report = ctx.reconciler().reconcile_all()?;
    let (skills, deployments, diverged, pending_events) = ctx.db.dashboard_counts()?;

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "skills": skills,
            "deployments": deployments,
            "diverged": diverged,
            "pending_events": pending_events,
            "report": report,
        }));
    }

    println!(
        "{} skills, {} deployments ({} synced, {} diverged, {} missing, {} untracked)",
        skills,
        report.total_deployments,
        report.synced.to_string().green(),
        report.diverged.to_string().yellow(),
        report.missing.to_string().red(),
        report.untracked.len()
    );

    for detail in &report.details {
        if args.problems && detail.status == DeploymentStatus::Synced {
            continue;
        }
        let status = match detail.status {
            DeploymentStatus::Synced => "synced".green(),
            DeploymentStatus::Diverged => "diverged".yellow(),
            DeploymentStatus::Missing => "missing".red(),
            DeploymentStatus::Untracked => "untracked".cyan(),
            DeploymentStatus::Pending => "pending".normal(),
        };
        println!(
            "  {:<10} {:<24} {:<12} {}",
            status, detail.skill_name, detail.tool, detail.deploy_path
        );
    }

    for untracked in &report.untracked {
        println!(
            "  {:<10} {:<24} {:<12} {}",
            "untracked".cyan(),
            untracked.name,
            untracked.tool,
            untracked.path
        );
    }

    for error in &report.errors {
        println!("  {:<10} {}", "error".red().bold(), error);
    }

    if pending_events > 0 {
        println!(
            "\n{} pending change events (see `sks events list`)",
            pending_events.to_string().yellow()
        );
    }
    Ok(())
}
