//! sks history - sync action audit log.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

pub fn run(ctx: &AppContext, args: &HistoryArgs) -> Result<()> {
    let entries = ctx.db.list_history(args.limit)?;

    if ctx.json {
        return super::print_json(&entries);
    }

    for entry in &entries {
        let status = if entry.status == "success" {
            entry.status.green()
        } else {
            entry.status.red().bold()
        };
        // Referenced skills may have been deleted since; fall back to ids.
        let skill = match entry.skill_id.as_deref() {
            Some(id) => ctx
                .db
                .get_skill(id)?
                .map_or_else(|| format!("unknown ({id})"), |s| s.name),
            None => "-".to_string(),
        };
        println!(
            "{}  {:<8} {:<8} {:<24} {}",
            entry.created_at,
            entry.action.as_str(),
            status,
            skill,
            entry.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
