//! Planning, task execution and batch chapter writing for Scrivener.
//!
//! The pieces, leaves first:
//!
//! - [`parse_actions`] and friends read `[ACTION:TYPE]{json}[/ACTION]` tags
//!   out of model output.
//! - [`ManifestPlanner`] asks the model for the whole pipeline of tasks up
//!   front and parses it into a [`Manifest`].
//! - [`AgentCore`] walks that manifest one task at a time, handing each to a
//!   [`TaskHandler`], with pause, resume and stop.
//! - [`BatchWriteEngine`] writes chapters from an outline, several per
//!   request, and splits the replies back into chapters.
//! - [`get_chapter_context`] and [`process_text_with_regex`] build the
//!   context fed to each generation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod agent;
mod batch_write;
mod chapter_split;
mod config;
mod context;
mod extraction;
mod manifest;
mod planner;
mod regex_script;

pub use action::{Action, UiAction, clean_text, has_action, parse_actions, replace_macros};
pub use agent::{
    AgentCore, AgentCoreState, AgentStatus, MAX_LOG_ENTRIES, StateSubscriber, TaskHandler,
};
pub use batch_write::{
    BatchWriteEngine, MAX_BATCH_TOKENS, RunOptions, WriteObserver, batch_token_budget,
};
pub use chapter_split::{MISSING_CHAPTER_PLACEHOLDER, split_batch_response};
pub use config::{ApiConfig, ContextConfig, ContextScope, ScrivenerConfig, WritingConfig};
pub use context::{build_world_info_context, chapter_number, get_chapter_context};
pub use extraction::{extract_balanced, outer_object_span, strip_code_fences};
pub use manifest::{Manifest, Task, TaskStatus, TaskType};
pub use planner::{ManifestPlanner, build_system_prompt, build_user_prompt, parse_manifest};
pub use regex_script::{CompiledPattern, apply_regex_to_text, process_text_with_regex};
