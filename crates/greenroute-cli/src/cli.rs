//! CLI command definitions using clap

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GreenRoute CLI - Environmental route scoring and prediction
#[derive(Parser)]
#[command(name = "greenroute")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Engine configuration file
    #[arg(short = 'c', long, global = true, env = "GREENROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Train the predictor on historical examples and save the bundle
    Train {
        /// JSON array of historical examples
        #[arg(short, long)]
        data: PathBuf,

        /// Model bundle directory
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },

    /// Grow a saved predictor with new examples
    Update {
        /// JSON array of historical examples
        #[arg(short, long)]
        data: PathBuf,

        /// Model bundle directory
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },

    /// Score and rank candidate routes
    Score {
        /// Scoring request (routes, vehicle, preferences, signals)
        request: PathBuf,

        /// Model bundle directory; scores deterministically when absent
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },

    /// Estimate emissions and suggest reductions for one route
    Suggest {
        /// Emissions request (route, vehicle, weather, traffic)
        request: PathBuf,
    },

    /// Check a preference set and show the weights it resolves to
    Prefs {
        /// Preference set JSON
        file: PathBuf,
    },

    /// Show the state of a saved predictor
    Inspect {
        /// Model bundle directory
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },
}
