//! sks init - set up the application root.

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Write a config.toml with the defaults spelled out
    #[arg(long)]
    pub with_config: bool,
}

pub fn run(ctx: &AppContext, args: &InitArgs) -> Result<()> {
    std::fs::create_dir_all(ctx.library_root())?;
    std::fs::create_dir_all(ctx.backup_root())?;

    if args.with_config {
        let config_path = ctx.root.join("config.toml");
        if !config_path.exists() {
            let rendered = toml::to_string_pretty(&ctx.config)
                .map_err(|e| crate::error::SyncError::Config(e.to_string()))?;
            std::fs::write(&config_path, rendered)?;
        }
    }

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "root": ctx.root,
            "library": ctx.library_root(),
            "backups": ctx.backup_root(),
            "schema_version": ctx.db.schema_version(),
        }));
    }

    println!("{} {}", "Initialized".green().bold(), ctx.root.display());
    println!("  library: {}", ctx.library_root().display());
    println!("  backups: {}", ctx.backup_root().display());
    Ok(())
}
