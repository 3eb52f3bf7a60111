//! Core data types for the Scrivener novel automation library.
//!
//! This crate provides the foundation types used across all Scrivener
//! crates: chat messages and requests, the novel aggregate with its
//! chapters and reference sets, regex post-processing rules and prompt
//! presets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod novel;
mod prompt;
mod request;
mod role;
mod script;
mod sets;
mod token_usage;

pub use message::{Message, MessageBuilder};
pub use novel::{
    Chapter, ChapterBuilder, ChapterSubtype, Novel, NovelBuilder, SummaryRange, Volume,
};
pub use prompt::PromptItem;
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse};
pub use role::Role;
pub use script::{PLACEMENT_AI_OUTPUT, PLACEMENT_USER_INPUT, RegexScript, RegexScriptBuilder};
pub use sets::{
    CharacterProfile, CharacterSet, OutlineItem, OutlineSet, WorldEntry, WorldviewSet,
};
pub use token_usage::TokenUsage;
