//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the scrivener binary.

mod actions;
mod commands;
mod plan;
mod run;
mod write;

pub use actions::show_actions;
pub use commands::{Cli, Commands, WriteArgs};
pub use plan::plan_novel;
pub use run::run_novel;
pub use write::write_novel;

use scrivener::{ScrivenerConfig, ScrivenerResult};
use std::path::Path;

/// Loads configuration, preferring an explicit file when one is given.
fn load_config(path: Option<&Path>) -> ScrivenerResult<ScrivenerConfig> {
    match path {
        Some(path) => ScrivenerConfig::from_file(path),
        None => ScrivenerConfig::load(),
    }
}

/// Runs `stop` when the user presses Ctrl-C.
fn stop_on_ctrl_c(stop: impl FnOnce() + Send + 'static) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            stop();
        }
    })
}
