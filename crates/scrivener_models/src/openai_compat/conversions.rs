//! Type conversions between Scrivener and OpenAI formats.

use crate::openai_compat::{ChatCompletionChunk, ChatMessage, ChatRequest, ChatResponse};
use scrivener_core::{GenerateRequest, GenerateResponse, TokenUsage};
use scrivener_error::{CompletionError, CompletionErrorKind};
use scrivener_interface::{FinishReason, StreamChunk};

/// Converts a GenerateRequest to OpenAI chat format.
///
/// The request's own model wins over the client default.
pub fn to_chat_request(
    req: &GenerateRequest,
    default_model: &str,
    stream: bool,
) -> Result<ChatRequest, CompletionError> {
    let messages: Vec<ChatMessage> = req
        .messages()
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role().to_string(),
            content: Some(msg.content().clone()),
        })
        .collect();

    if messages.is_empty() {
        return Err(CompletionError::new(CompletionErrorKind::InvalidRequest(
            "Request has no messages".to_string(),
        )));
    }

    let model = req
        .model()
        .clone()
        .unwrap_or_else(|| default_model.to_string());

    ChatRequest::builder()
        .model(model)
        .messages(messages)
        .stream(stream)
        .max_tokens(*req.max_tokens())
        .temperature(*req.temperature())
        .top_p(*req.top_p())
        .top_k(*req.top_k())
        .build()
        .map_err(|e| {
            CompletionError::new(CompletionErrorKind::InvalidRequest(format!(
                "Failed to build request: {}",
                e
            )))
        })
}

/// Converts an OpenAI chat response to a GenerateResponse.
pub fn from_chat_response(response: &ChatResponse) -> Result<GenerateResponse, CompletionError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| CompletionError::new(CompletionErrorKind::EmptyResponse))?;

    let content = choice.message.content.clone().unwrap_or_default();

    let usage = response.usage.as_ref().and_then(|u| {
        match (u.prompt_tokens, u.completion_tokens) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
            _ => None,
        }
    });

    Ok(GenerateResponse::new(content, usage))
}

/// Converts a decoded stream chunk to the provider-neutral form.
pub fn from_chunk(chunk: &ChatCompletionChunk) -> StreamChunk {
    let Some(choice) = chunk.choices.first() else {
        return StreamChunk::text("");
    };

    let finish_reason = choice.finish_reason.as_deref().map(FinishReason::from_wire);
    StreamChunk {
        content: choice.delta.content.clone().unwrap_or_default(),
        is_final: finish_reason.is_some(),
        finish_reason,
    }
}
