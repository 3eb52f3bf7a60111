//! Chat-completion provider integrations for Scrivener.
//!
//! Currently a single generic client covers every provider that speaks the
//! OpenAI chat completions protocol.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod openai_compat;

pub use openai_compat::OpenAICompatibleClient;
