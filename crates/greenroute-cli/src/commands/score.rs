//! `greenroute score` command implementation

use crate::context::{CliContext, read_json};
use colored::Colorize;
use greenroute_foundation::cache::{InMemorySignalStore, SignalCache};
use greenroute_foundation::preferences::PreferenceSet;
use greenroute_foundation::scoring::{RankedScore, ScoringOrchestrator};
use greenroute_foundation::signals::{RouteSignals, SignalHub, StaticSignalProvider};
use greenroute_kernel::{Route, Vehicle};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct ScoreRequest {
    routes: Vec<Route>,
    vehicle: Vehicle,
    preferences: PreferenceSet,
    /// Conditions applied to every route
    #[serde(default)]
    signals: RouteSignals,
}

/// Execute the `greenroute score` command
pub async fn run(ctx: &CliContext, request: &Path, model_dir: Option<&Path>) -> anyhow::Result<()> {
    let req: ScoreRequest = read_json(request)?;
    let dir = ctx.model_dir(model_dir);

    let engine = if CliContext::has_bundle(&dir) {
        ctx.restored_engine(&dir)?
    } else {
        warn!(
            "No model bundle at {}, scoring with the deterministic estimate",
            dir.display()
        );
        ctx.engine()
    };

    let cache = Arc::new(
        SignalCache::open(InMemorySignalStore::shared(), ctx.config.cache.clone()).await,
    );
    let hub = SignalHub::new(
        cache.clone(),
        Arc::new(StaticSignalProvider::new(req.signals).with_name("request")),
    );
    let orchestrator =
        ScoringOrchestrator::new(Arc::new(engine), ctx.config.scoring.clone()).with_cache(cache);

    info!("Scoring {} candidate route(s)", req.routes.len());
    let ranked = orchestrator
        .score_candidates(&hub, &req.routes, &req.vehicle, &req.preferences)
        .await?;

    ctx.output.emit(&ranked, |ranked| print_ranking(ranked))
}

fn print_ranking(ranked: &[RankedScore]) {
    if ranked.is_empty() {
        println!("{}", "No route satisfies the preferences".yellow());
        return;
    }
    for (i, score) in ranked.iter().enumerate() {
        let b = &score.breakdown;
        println!(
            "{}. {}  score {}",
            i + 1,
            score.route_id.bold(),
            format!("{:.2}", score.composite).green()
        );
        println!(
            "   {:.1} km  {:.1} min  {:.2} kg CO₂  cost {:.2}  eco {:.0}",
            b.distance_km, b.time_min, b.emissions_kg, b.cost, b.eco_score
        );
        if b.prediction.is_some() {
            println!(
                "   confidence: traffic {:.2}  emissions {:.2}  duration {:.2}",
                b.confidence.traffic, b.confidence.emissions, b.confidence.duration
            );
        }
    }
}
