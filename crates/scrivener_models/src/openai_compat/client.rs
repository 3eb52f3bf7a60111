//! Generic client for OpenAI-compatible APIs.

use crate::openai_compat::{
    ChatCompletionChunk, ChatResponse, SseDecoder, SseEvent, conversions,
};
use async_trait::async_trait;
use futures_util::{StreamExt, future, stream};
use reqwest::Client;
use scrivener_core::{GenerateRequest, GenerateResponse};
use scrivener_error::{CompletionError, CompletionErrorKind, ScrivenerResult};
use scrivener_interface::{
    ChunkStream, CompletionDriver, FinishReason, StreamChunk, Streaming,
};
use tracing::{debug, error, instrument};

const COMPLETIONS_PATH: &str = "/chat/completions";

/// Generic client for any OpenAI-compatible API.
///
/// Works against OpenAI itself and the many servers that copy its chat
/// completions format (DeepSeek, OpenRouter, local llama.cpp and vLLM
/// servers, and so on).
#[derive(Debug, Clone)]
pub struct OpenAICompatibleClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    provider_name: &'static str,
}

impl OpenAICompatibleClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key for authentication
    /// * `model` - Default model identifier
    /// * `base_url` - Base URL, with or without the `/chat/completions` suffix
    /// * `provider_name` - Name of the provider (for logging/tracing)
    #[instrument(skip(api_key), fields(provider = provider_name, model = %model))]
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        provider_name: &'static str,
    ) -> Self {
        let endpoint = completions_endpoint(base_url);

        debug!(
            provider = provider_name,
            model = %model,
            url = %endpoint,
            "Created OpenAI-compatible client"
        );

        Self {
            client: Client::new(),
            api_key,
            model,
            endpoint,
            provider_name,
        }
    }

    /// Returns the resolved completions endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, req: &GenerateRequest, stream: bool) -> ScrivenerResult<reqwest::Response> {
        let chat_request = conversions::to_chat_request(req, &self.model, stream)?;

        debug!(
            provider = self.provider_name,
            model = %chat_request.model(),
            message_count = chat_request.messages().len(),
            stream,
            "Sending request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.provider_name, error = ?e, "HTTP request failed");
                CompletionError::new(CompletionErrorKind::Http(format!("Request failed: {}", e)))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                provider = self.provider_name,
                status = %status,
                error = %error_text,
                "API error"
            );

            return Err(CompletionError::new(CompletionErrorKind::Api {
                status: status.as_u16(),
                message: error_text,
            })
            .into());
        }

        Ok(response)
    }
}

/// Appends the completions path unless the URL already ends with it.
fn completions_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, COMPLETIONS_PATH)
    }
}

/// Turns one decoded SSE event into a chunk.
fn event_to_chunk(event: SseEvent) -> ScrivenerResult<StreamChunk> {
    match event {
        SseEvent::Done => Ok(StreamChunk::finished(FinishReason::Stop)),
        SseEvent::Data(data) => {
            let chunk: ChatCompletionChunk = serde_json::from_str(&data).map_err(|e| {
                error!(error = %e, data = %data, "Failed to parse stream chunk");
                CompletionError::new(CompletionErrorKind::Stream(format!(
                    "Failed to parse chunk: {}",
                    e
                )))
            })?;
            Ok(conversions::from_chunk(&chunk))
        }
    }
}

/// Parses a Server-Sent Events body into provider-neutral chunks.
fn parse_sse_stream(response: reqwest::Response) -> ChunkStream {
    let body = response
        .bytes_stream()
        .map(Some)
        .chain(stream::once(future::ready(None)));

    let chunks = body
        .scan(SseDecoder::default(), |decoder, item| {
            let items: Vec<ScrivenerResult<StreamChunk>> = match item {
                Some(Ok(bytes)) => decoder.push(&bytes).into_iter().map(event_to_chunk).collect(),
                Some(Err(e)) => vec![Err(CompletionError::new(CompletionErrorKind::Stream(
                    format!("Stream error: {}", e),
                ))
                .into())],
                None => decoder.finish().into_iter().map(event_to_chunk).collect(),
            };
            future::ready(Some(stream::iter(items)))
        })
        .flatten();

    Box::pin(chunks)
}

#[async_trait]
impl CompletionDriver for OpenAICompatibleClient {
    #[instrument(skip(self, req), fields(provider = self.provider_name, model = %self.model))]
    async fn generate(&self, req: &GenerateRequest) -> ScrivenerResult<GenerateResponse> {
        let response = self.send(req, false).await?;

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = self.provider_name, error = ?e, "Failed to parse response");
            CompletionError::new(CompletionErrorKind::ResponseParsing(format!(
                "Failed to parse JSON: {}",
                e
            )))
        })?;

        debug!(
            provider = self.provider_name,
            choices = chat_response.choices.len(),
            "Received response"
        );

        Ok(conversions::from_chat_response(&chat_response)?)
    }

    fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Streaming for OpenAICompatibleClient {
    #[instrument(skip(self, req), fields(provider = self.provider_name, model = %self.model))]
    async fn generate_stream(&self, req: &GenerateRequest) -> ScrivenerResult<ChunkStream> {
        let response = self.send(req, true).await?;
        debug!(provider = self.provider_name, "Stream opened");
        Ok(parse_sse_stream(response))
    }
}
