//! Error types for the Scrivener library.
//!
//! This crate provides the foundation error types used throughout the Scrivener workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use scrivener_error::{ScrivenerResult, WriteError, WriteErrorKind};
//!
//! fn write_chapter(title: &str) -> ScrivenerResult<String> {
//!     Err(WriteError::new(WriteErrorKind::EmptyResponse(title.to_string())))?
//! }
//!
//! match write_chapter("The Storm") {
//!     Ok(text) => println!("Wrote {} chars", text.len()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod agent;
mod completion;
mod config;
mod error;
mod json;
mod storage;
mod write;

pub use action::ActionError;
pub use agent::{AgentError, AgentErrorKind};
pub use completion::{CompletionError, CompletionErrorKind};
pub use config::ConfigError;
pub use error::{ScrivenerError, ScrivenerErrorKind, ScrivenerResult};
pub use json::JsonError;
pub use storage::{StorageError, StorageErrorKind};
pub use write::{WriteError, WriteErrorKind};
