//! `greenroute suggest` command implementation

use crate::context::{CliContext, read_json};
use colored::Colorize;
use greenroute_foundation::emissions::{EmissionsEstimate, EmissionsModel, ReductionSuggestion};
use greenroute_kernel::{Route, TrafficSnapshot, Vehicle, WeatherSnapshot};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SuggestRequest {
    route: Route,
    vehicle: Vehicle,
    #[serde(default)]
    weather: WeatherSnapshot,
    #[serde(default)]
    traffic: TrafficSnapshot,
}

#[derive(Debug, Serialize)]
struct SuggestResponse {
    estimate: EmissionsEstimate,
    eco_score: f64,
    suggestions: Vec<ReductionSuggestion>,
}

/// Execute the `greenroute suggest` command
pub fn run(ctx: &CliContext, request: &Path) -> anyhow::Result<()> {
    let req: SuggestRequest = read_json(request)?;
    req.route.validate()?;

    let model = EmissionsModel::new();
    let estimate = model.estimate(&req.route, &req.vehicle, &req.weather, &req.traffic);
    let suggestions = model.suggest_reductions(&req.route, &req.vehicle, &estimate);
    let response = SuggestResponse {
        eco_score: estimate.eco_score(),
        estimate,
        suggestions,
    };

    ctx.output.emit(&response, |r| {
        println!(
            "{} {:.2} kg CO₂ over {:.1} km (eco score {:.0})",
            "Estimate".bold(),
            r.estimate.total_emissions_kg,
            r.estimate.route_length_km,
            r.eco_score
        );
        for s in &r.suggestions {
            println!(
                "  • {} (saves {:.2} kg)",
                s.suggestion,
                s.potential_savings_kg
            );
        }
    })
}
