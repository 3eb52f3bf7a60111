//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scrivener - plan and write novels with OpenAI-compatible models
#[derive(Parser, Debug)]
#[command(name = "scrivener")]
#[command(about = "Plan and write novels with OpenAI-compatible models", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file to use instead of the usual search
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the model for a task manifest
    Plan {
        /// Path to the novel JSON file
        #[arg(long)]
        novel: PathBuf,

        /// What the novel should be about
        #[arg(long)]
        instruction: String,

        /// Save the manifest here instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write chapters from an outline set
    Write(WriteArgs),

    /// Plan, then execute every task in the manifest
    Run {
        /// Path to the novel JSON file
        #[arg(long)]
        novel: PathBuf,

        /// What the novel should be about
        #[arg(long)]
        instruction: String,

        /// Outline set chapter tasks write from
        #[arg(long)]
        outline_set: Option<String>,

        /// JSON file of regex scripts
        #[arg(long)]
        scripts: Option<PathBuf>,
    },

    /// Print the action tags found in a text file
    Actions {
        /// File holding model output
        #[arg(long)]
        file: PathBuf,
    },
}

/// Arguments of the `write` command
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Path to the novel JSON file
    #[arg(long)]
    pub novel: PathBuf,

    /// Outline set to write from
    #[arg(long)]
    pub outline_set: String,

    /// First outline item to write
    #[arg(long, default_value = "0")]
    pub start: usize,

    /// Volume new chapters are filed into
    #[arg(long)]
    pub volume: Option<String>,

    /// Include the whole outline in every prompt
    #[arg(long)]
    pub full_outline: bool,

    /// JSON file of regex scripts
    #[arg(long)]
    pub scripts: Option<PathBuf>,
}
