//! Trait definitions for the Scrivener novel automation library.
//!
//! This crate defines the driver traits that completion backends implement
//! and the chunk type streamed back from them. The automation crate only
//! ever talks to these traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ChunkStream, CompletionDriver, Streaming};
pub use types::{FinishReason, StreamChunk};
