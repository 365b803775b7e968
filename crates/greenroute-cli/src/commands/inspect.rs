//! `greenroute inspect` command implementation

use crate::context::CliContext;
use colored::Colorize;
use std::path::Path;

/// Execute the `greenroute inspect` command
pub fn run(ctx: &CliContext, model_dir: Option<&Path>) -> anyhow::Result<()> {
    let dir = ctx.model_dir(model_dir);
    let engine = ctx.restored_engine(&dir)?;

    ctx.output.emit(&engine.status(), |status| {
        println!();
        println!("  {}", "Predictor".bold());
        println!("    Bundle:     {}", dir.display().to_string().cyan());
        println!("    State:      {:?}", status.state);
        println!(
            "    Members:    traffic {}  emissions {}  duration {}",
            status.traffic_members.to_string().yellow(),
            status.emissions_members.to_string().yellow(),
            status.duration_members.to_string().yellow()
        );
        println!("    Examples:   {}", status.examples_seen);
        if let Some(id) = status.scaler_id {
            println!("    Scaler:     {}", id);
        }
        if let Some(id) = status.revision {
            println!("    Revision:   {}", id);
        }
        println!("    Holidays:   {}", status.holidays);
        println!();
    })
}
