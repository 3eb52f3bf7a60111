//! Types shared by driver implementations.

use serde::{Deserialize, Serialize};

/// A chunk of streamed output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental text
    pub content: String,
    /// Whether this is the final chunk.
    pub is_final: bool,
    /// Optional finish reason if final.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// Creates a non-final text chunk.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: false,
            finish_reason: None,
        }
    }

    /// Creates a final chunk carrying the finish reason.
    pub fn finished(reason: FinishReason) -> Self {
        Self {
            content: String::new(),
            is_final: true,
            finish_reason: Some(reason),
        }
    }
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Content was filtered.
    ContentFilter,
    /// Other/unknown reason.
    Other,
}

impl FinishReason {
    /// Maps an OpenAI-style `finish_reason` string.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}
