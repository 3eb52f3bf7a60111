//! Generic OpenAI-compatible API client.
//!
//! This module provides a reusable client for any API that follows the OpenAI
//! chat completions format, including Server-Sent Events streaming.

mod client;
mod conversions;
mod dto;
mod sse;

pub use client::OpenAICompatibleClient;
pub use conversions::{from_chat_response, from_chunk, to_chat_request};
pub use dto::{
    ChatChoice, ChatCompletionChunk, ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse,
    ChatUsage, ChunkChoice, ChunkDelta,
};
pub use sse::{SseDecoder, SseEvent};
