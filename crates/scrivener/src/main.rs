//! Scrivener CLI binary.
//!
//! This binary provides command-line access to Scrivener:
//! - Plan a manifest for a novel from an instruction
//! - Write chapters from an outline set
//! - Plan and execute a whole manifest
//! - Inspect action tags in model output

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, plan_novel, run_novel, show_actions, write_novel};

    // API keys usually live in .env during development
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Plan {
            novel,
            instruction,
            out,
        } => {
            plan_novel(config, &novel, &instruction, out.as_deref()).await?;
        }

        Commands::Write(args) => {
            write_novel(config, &args).await?;
        }

        Commands::Run {
            novel,
            instruction,
            outline_set,
            scripts,
        } => {
            run_novel(config, &novel, &instruction, outline_set, scripts.as_deref()).await?;
        }

        Commands::Actions { file } => {
            show_actions(&file)?;
        }
    }

    Ok(())
}
