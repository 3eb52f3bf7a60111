//! Scrivener - plan and write novels with OpenAI-compatible models
//!
//! Scrivener drives a novel from a one-line instruction to written chapters.
//! A planner asks the model for the whole creative pipeline up front, the
//! automation core walks that pipeline task by task, and the batch write
//! engine turns outlines into chapters, several per request.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scrivener::{BatchWriteEngine, Novel, OpenAICompatibleClient, RunOptions, ScrivenerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScrivenerConfig::load()?;
//!     let client = Arc::new(scrivener::client_from_config(&config)?);
//!     let engine = BatchWriteEngine::new(client, config);
//!
//!     let novel = scrivener::load_novel("novel.json".as_ref())?;
//!     let outline = novel.outline_sets()[0].items().clone();
//!     let observer = scrivener::FileObserver::new(Some("novel.json".into()), Vec::new());
//!     let novel = engine.run(novel, &outline, 0, &RunOptions::default(), &observer).await;
//!     println!("{} chapters", novel.chapters().len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Scrivener is organized as a workspace with focused crates:
//!
//! - `scrivener_error` - Error types
//! - `scrivener_core` - Messages, requests and the novel model
//! - `scrivener_interface` - Completion driver traits
//! - `scrivener_models` - OpenAI-compatible client
//! - `scrivener_automation` - Actions, planner, automation core, batch writing
//!
//! This crate (`scrivener`) re-exports everything for convenience and adds
//! file storage and a headless task handler used by the CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod handler;
mod observer;
mod storage;

pub use handler::{NovelTaskHandler, TaskReply};
pub use observer::FileObserver;
pub use storage::{load_novel, load_scripts, read_json, save_novel, write_json};

pub use scrivener_automation::*;
pub use scrivener_core::*;
pub use scrivener_error::*;
pub use scrivener_interface::*;
pub use scrivener_models::*;

/// Provider name reported by clients built from configuration.
pub const PROVIDER_NAME: &str = "openai-compatible";

/// Builds the completion client described by `config.api`.
///
/// # Errors
///
/// Fails when the API key environment variable is not set.
pub fn client_from_config(config: &ScrivenerConfig) -> ScrivenerResult<OpenAICompatibleClient> {
    let api = &config.api;
    Ok(OpenAICompatibleClient::new(
        api.api_key()?,
        api.model.clone(),
        &api.base_url,
        PROVIDER_NAME,
    ))
}
