//! Request and response types for chat completion.

use crate::{Message, TokenUsage};
use serde::{Deserialize, Serialize};

/// Provider-neutral chat completion request.
///
/// Sampling fields left as `None` fall back to whatever the driver was
/// configured with.
///
/// # Examples
///
/// ```
/// use scrivener_core::{GenerateRequest, Message};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![Message::user("Hello!")])
///     .max_tokens(Some(100))
///     .temperature(Some(0.7))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages().len(), 1);
/// assert_eq!(*request.max_tokens(), Some(100));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Default,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into), default)]
pub struct GenerateRequest {
    /// The conversation messages to send
    messages: Vec<Message>,
    /// Maximum number of tokens to generate
    max_tokens: Option<u32>,
    /// Sampling temperature
    temperature: Option<f32>,
    /// Nucleus sampling cutoff
    top_p: Option<f32>,
    /// Top-k sampling cutoff
    top_k: Option<u32>,
    /// Model identifier to use
    model: Option<String>,
}

impl GenerateRequest {
    /// Creates a request with only messages set.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Returns a builder for constructing a GenerateRequest.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// A completed (non-streamed) chat response.
///
/// # Examples
///
/// ```
/// use scrivener_core::GenerateResponse;
///
/// let response = GenerateResponse::new("Once upon a time", None);
/// assert_eq!(response.content(), "Once upon a time");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerateResponse {
    /// Text of the first choice
    content: String,
    /// Token accounting, when the provider reports it
    usage: Option<TokenUsage>,
}

impl GenerateResponse {
    /// Creates a response.
    pub fn new(content: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        Self {
            content: content.into(),
            usage,
        }
    }
}
