//! sks diff - line-level diff of two skill directories.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::diff::{diff_paths, FileDiffStatus};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Left side (typically the library copy)
    pub left: PathBuf,
    /// Right side (typically the deployed copy)
    pub right: PathBuf,
}

pub fn run(ctx: &AppContext, args: &DiffArgs) -> Result<()> {
    let result = diff_paths(&args.left, &args.right)?;

    if ctx.json {
        return super::print_json(&result);
    }

    println!(
        "{} added, {} removed, {} modified, {} unchanged",
        result.summary.added.to_string().green(),
        result.summary.removed.to_string().red(),
        result.summary.modified.to_string().yellow(),
        result.summary.unchanged
    );

    for file in &result.files {
        match file.status {
            FileDiffStatus::Unchanged => continue,
            FileDiffStatus::Added => println!("{} {}", "A".green().bold(), file.path),
            FileDiffStatus::Removed => println!("{} {}", "D".red().bold(), file.path),
            FileDiffStatus::Modified => {
                let marker = if file.is_binary { "M (binary)" } else { "M" };
                println!("{} {}", marker.yellow().bold(), file.path);
                for hunk in &file.hunks {
                    println!(
                        "  @@ -{},{} +{},{} @@",
                        hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
                    );
                    for line in &hunk.lines {
                        let rendered = format!("  {}{}", line.tag, line.content.trim_end_matches('\n'));
                        match line.tag {
                            '+' => println!("{}", rendered.green()),
                            '-' => println!("{}", rendered.red()),
                            _ => println!("{rendered}"),
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
