//! sks events - change event log.

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::core::models::EventResolution;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    /// List change events (pending by default)
    List(EventListArgs),
    /// Mark an event resolved or ignored
    Resolve(EventResolveArgs),
}

#[derive(Args, Debug)]
pub struct EventListArgs {
    /// Include resolved and ignored events
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct EventResolveArgs {
    /// Event id
    pub event_id: String,
    /// Mark ignored instead of resolved
    #[arg(long)]
    pub ignore: bool,
}

pub fn run(ctx: &AppContext, args: &EventsArgs) -> Result<()> {
    match &args.command {
        EventsCommand::List(list) => run_list(ctx, list),
        EventsCommand::Resolve(resolve) => run_resolve(ctx, resolve),
    }
}

fn run_list(ctx: &AppContext, args: &EventListArgs) -> Result<()> {
    let filter = if args.all {
        None
    } else {
        Some(EventResolution::Pending)
    };
    let events = ctx.db.list_change_events(filter)?;

    if ctx.json {
        return super::print_json(&events);
    }

    for event in &events {
        // The deployment may be gone; show what we know either way.
        let target = ctx
            .db
            .get_deployment(&event.deployment_id)?
            .map_or_else(|| format!("unknown ({})", event.deployment_id), |d| d.path);
        println!(
            "{}  {:<18} {:<9} {}  {}",
            event.id,
            event.event_type.as_str().yellow(),
            event.resolution.as_str(),
            event.created_at,
            target
        );
    }
    Ok(())
}

fn run_resolve(ctx: &AppContext, args: &EventResolveArgs) -> Result<()> {
    let resolution = if args.ignore {
        EventResolution::Ignored
    } else {
        EventResolution::Resolved
    };
    ctx.db.resolve_change_event(&args.event_id, resolution)?;

    if ctx.json {
        return super::print_json(&serde_json::json!({
            "event_id": args.event_id,
            "resolution": resolution,
        }));
    }
    println!(
        "{} event {} as {}",
        "marked".green().bold(),
        args.event_id,
        resolution.as_str()
    );
    Ok(())
}
