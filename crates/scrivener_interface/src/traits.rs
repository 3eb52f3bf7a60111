//! Trait definitions for chat-completion backends.

use crate::StreamChunk;
use async_trait::async_trait;
use futures_util::stream::Stream;
use scrivener_core::{GenerateRequest, GenerateResponse};
use scrivener_error::ScrivenerResult;
use std::pin::Pin;

/// Boxed stream of response chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = ScrivenerResult<StreamChunk>> + Send>>;

/// Core trait that all completion backends must implement.
#[async_trait]
pub trait CompletionDriver: Send + Sync {
    /// Generate a complete reply for a request.
    async fn generate(&self, req: &GenerateRequest) -> ScrivenerResult<GenerateResponse>;

    /// Provider name (e.g., "openai", "deepseek").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Trait for backends that support streaming responses.
#[async_trait]
pub trait Streaming: CompletionDriver {
    /// Generate a streaming response.
    ///
    /// Returns a stream that yields chunks as they arrive from the API.
    async fn generate_stream(&self, req: &GenerateRequest) -> ScrivenerResult<ChunkStream>;
}
