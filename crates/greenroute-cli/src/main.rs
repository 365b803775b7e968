//! GreenRoute CLI - Train the route predictor and score candidate routes

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::CliContext;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = CliContext::new(cli.config.as_deref(), cli.output)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_command_async(&ctx, cli.command))
}

async fn run_command_async(ctx: &CliContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Train { data, model_dir } => {
            commands::train::run(ctx, &data, model_dir.as_deref())?;
        }

        Commands::Update { data, model_dir } => {
            commands::update::run(ctx, &data, model_dir.as_deref())?;
        }

        Commands::Score { request, model_dir } => {
            commands::score::run(ctx, &request, model_dir.as_deref()).await?;
        }

        Commands::Suggest { request } => {
            commands::suggest::run(ctx, &request)?;
        }

        Commands::Prefs { file } => {
            commands::prefs::run(ctx, &file)?;
        }

        Commands::Inspect { model_dir } => {
            commands::inspect::run(ctx, model_dir.as_deref())?;
        }
    }

    Ok(())
}
