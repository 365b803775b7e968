//! `greenroute update` command implementation

use crate::context::{CliContext, read_json};
use colored::Colorize;
use greenroute_foundation::prediction::HistoricalExample;
use std::path::Path;

/// Execute the `greenroute update` command
///
/// Restores the bundle when one exists; otherwise the update trains from
/// scratch.
pub fn run(ctx: &CliContext, data: &Path, model_dir: Option<&Path>) -> anyhow::Result<()> {
    let examples: Vec<HistoricalExample> = read_json(data)?;
    let dir = ctx.model_dir(model_dir);

    let engine = if CliContext::has_bundle(&dir) {
        ctx.restored_engine(&dir)?
    } else {
        ctx.engine()
    };
    let before = engine.status().traffic_members;
    engine.update(&examples)?;
    std::fs::create_dir_all(&dir)?;
    engine
        .persist(&dir)
        .map_err(|report| anyhow::anyhow!("{report:?}"))?;

    ctx.output.emit(&engine.status(), |status| {
        println!(
            "{} {} -> {} trees per target ({} new examples)",
            "Updated".green().bold(),
            before,
            status.traffic_members,
            examples.len()
        );
    })
}
