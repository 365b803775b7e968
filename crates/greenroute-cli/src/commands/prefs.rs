//! `greenroute prefs` command implementation

use crate::context::{CliContext, read_json};
use colored::Colorize;
use greenroute_foundation::preferences::{self, PreferenceSet};
use std::path::Path;

/// Execute the `greenroute prefs` command
pub fn run(ctx: &CliContext, file: &Path) -> anyhow::Result<()> {
    let prefs: PreferenceSet = read_json(file)?;
    preferences::check(&prefs)?;
    let weights = preferences::derive_weights(&prefs);

    ctx.output.emit(&weights, |w| {
        println!("{} preferences of {}", "Valid".green().bold(), prefs.user_id);
        println!(
            "  distance {:.2}  time {:.2}  emissions {:.2}  cost {:.2}  weather {:.2}",
            w.distance, w.time, w.emissions, w.cost, w.weather_sensitivity
        );
        let flags: Vec<&str> = [
            (w.eco_friendly, "eco_friendly"),
            (w.speed_priority, "speed_priority"),
            (w.avoid_tolls, "avoid_tolls"),
            (w.avoid_highways, "avoid_highways"),
            (w.avoid_peak_hours, "avoid_peak_hours"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        if !flags.is_empty() {
            println!("  flags: {}", flags.join(", "));
        }
    })
}
