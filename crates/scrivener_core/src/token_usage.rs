//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token counts reported by a provider for one request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct TokenUsage {
    /// Tokens in the prompt
    prompt_tokens: u64,
    /// Tokens in the completion
    completion_tokens: u64,
    /// Total tokens
    total_tokens: u64,
}

impl TokenUsage {
    /// Creates a usage record; the total is derived.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}
