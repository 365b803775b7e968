//! `greenroute train` command implementation

use crate::context::{CliContext, read_json};
use colored::Colorize;
use greenroute_foundation::prediction::HistoricalExample;
use std::path::Path;
use tracing::info;

/// Execute the `greenroute train` command
pub fn run(ctx: &CliContext, data: &Path, model_dir: Option<&Path>) -> anyhow::Result<()> {
    let examples: Vec<HistoricalExample> = read_json(data)?;
    let dir = ctx.model_dir(model_dir);
    info!("Training on {} example(s) from {}", examples.len(), data.display());

    let engine = ctx.engine();
    engine.train(&examples)?;
    std::fs::create_dir_all(&dir)?;
    engine
        .persist(&dir)
        .map_err(|report| anyhow::anyhow!("{report:?}"))?;

    ctx.output.emit(&engine.status(), |status| {
        println!(
            "{} {} trees per target on {} examples",
            "Trained".green().bold(),
            status.traffic_members,
            status.examples_seen
        );
        println!("  Bundle: {}", dir.display().to_string().cyan());
    })
}
